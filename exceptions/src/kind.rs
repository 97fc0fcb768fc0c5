use serde_json::{Map, Value};
use uuid::Uuid;

use crate::args::Arg;
use crate::error::Error;
use crate::exception::Exception;

/// Opaque identity token owned by a [`Kind`]. Equality of tokens is the
/// whole membership test; no type hierarchy is ever walked, so the check
/// holds for instances rehydrated from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KindId(Uuid);

impl KindId {
    pub(crate) fn new() -> Self {
        KindId(Uuid::new_v4())
    }
}

/// A named, reusable error template: default fields captured at definition
/// time plus an identity used for type checks. Immutable once defined;
/// typically held in module or global scope for the life of the process.
#[derive(Debug, Clone)]
pub struct Kind {
    id: KindId,
    defaults: Map<String, Value>,
}

impl Kind {
    /// Define a new kind, independent of any previously defined kind. The
    /// defaults are captured here; each instance starts from its own clone
    /// of them, so instances never alias each other or the stored
    /// defaults. A non-object value is treated as an empty default set.
    pub fn define(defaults: Value) -> Self {
        let defaults = match defaults {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Kind {
            id: KindId::new(),
            defaults,
        }
    }

    pub fn id(&self) -> KindId {
        self.id
    }

    pub fn defaults(&self) -> &Map<String, Value> {
        &self.defaults
    }

    /// Construct an exception of this kind. Arguments follow the same
    /// classification and merge rules as [`Exception::from_args`], with
    /// the field set seeded from this kind's defaults.
    pub fn build<I>(&self, args: I) -> Exception
    where
        I: IntoIterator<Item = Arg>,
    {
        Exception::assemble(args, self.defaults.clone(), Some(self.id))
    }

    /// Zero-argument construction: defaults only, trace captured here.
    pub fn new_exception(&self) -> Exception {
        self.build([])
    }

    /// Rehydrate a serialized exception as an instance of this kind. A
    /// direct field transplant, after which `is()` holds as if the value
    /// had been freshly constructed through this kind.
    pub fn deserialize(&self, text: &str) -> Result<Exception, Error> {
        let mut exception = Exception::deserialize(text)?;
        exception.set_kind_id(Some(self.id));
        Ok(exception)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::Kind;
    use crate::args::Arg;
    use crate::exception::Exception;

    #[test]
    fn kinds_with_identical_defaults_are_distinct() {
        let a = Kind::define(json!({ "codename": "SAME" }));
        let b = Kind::define(json!({ "codename": "SAME" }));

        let ex = a.new_exception();
        assert!(ex.is(&a));
        assert!(!ex.is(&b));
        assert!(!Exception::new().is(&a));
    }

    #[test]
    fn defaults_seed_the_field_set() {
        let kind = Kind::define(json!({
            "codename": "TOO_BUSY",
            "message": "I am a default error message"
        }));

        let ex = kind.new_exception();
        assert_eq!(ex.message(), "I am a default error message");
        assert_eq!(ex.field("codename"), Some(&json!("TOO_BUSY")));

        // An explicit message beats the default one.
        let ex = kind.build([Arg::text("explicit")]);
        assert_eq!(ex.message(), "explicit");
    }

    #[test]
    fn instances_do_not_share_fields() {
        let kind = Kind::define(json!({ "limit": 10 }));

        let mut first = kind.build([Arg::value(json!({ "param1": "value1" }))]);
        let second = kind.build([Arg::value(json!({ "param2": "value2" }))]);

        first.set_field("limit", json!(99));

        assert_eq!(second.field("limit"), Some(&json!(10)));
        assert_eq!(kind.defaults().get("limit"), Some(&json!(10)));
        assert!(second.field("param1").is_none());
    }

    #[test]
    fn non_object_defaults_are_an_empty_set() {
        let kind = Kind::define(json!("not a mapping"));
        let ex = kind.new_exception();
        assert_eq!(ex.message(), "");
        assert!(ex.fields().is_empty());
    }

    #[test]
    fn deserialized_instances_keep_kind_identity() {
        let kind = Kind::define(json!({ "codename": "TOO_SLOW" }));
        let ex = kind.build([Arg::text("timeout")]);

        let rehydrated = kind.deserialize(&ex.to_json(true)).unwrap();
        assert!(rehydrated.is(&kind));
        assert_eq!(rehydrated.message(), "timeout");
        assert_eq!(rehydrated.stack(), ex.stack());
    }
}
