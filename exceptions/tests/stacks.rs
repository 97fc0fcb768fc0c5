use exceptions::{Arg, Exception};

#[inline(never)]
fn descend(depth: usize) -> Exception {
    if depth == 0 {
        Exception::from_args([Arg::text("deep failure")])
    } else {
        descend(depth - 1)
    }
}

#[test]
fn deep_sync_chains_stay_clean() {
    let ex = descend(24);

    assert!(ex.stack().starts_with("Error: deep failure"));
    assert!(!ex.stack().contains("/.cargo/"));
    assert!(!ex.stack().contains("node_modules"));
    // Runtime internals are pruned along with dependency frames.
    assert!(!ex.stack().contains("/rustc/"));
}

async fn level_eight() -> Exception {
    Exception::new()
}

async fn level_seven() -> Exception {
    level_eight().await
}

async fn level_six() -> Exception {
    level_seven().await
}

async fn level_five() -> Exception {
    level_six().await
}

async fn level_four() -> Exception {
    level_five().await
}

async fn level_three() -> Exception {
    level_four().await
}

async fn level_two() -> Exception {
    level_three().await
}

async fn level_one() -> Exception {
    level_two().await
}

#[tokio::test]
async fn nested_async_chains_stay_clean() {
    let ex = level_one().await;

    assert!(ex.stack().starts_with("Error"));
    assert!(!ex.stack().contains("/.cargo/"));
    assert!(!ex.stack().contains("node_modules"));
}
