use proptest::test_runner::Config;

/// Proptest configuration shared by the crate's tests.
///
/// Every case packs and unpacks its value, often under several configs, so the case count is
/// capped below proptest's default (`PROPTEST_CASES` can still lower it). Miri gets a handful of
/// cases and no failure persistence, as it has no file system access.
pub(crate) fn proptest_cfg() -> Config {
    let base = Config::default();
    let cases = base.cases.min(128);
    if cfg!(miri) {
        Config {
            failure_persistence: None,
            cases: cases.min(5),
            ..base
        }
    } else {
        Config { cases, ..base }
    }
}
