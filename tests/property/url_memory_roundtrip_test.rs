//! Property-based tests for URL memory.
//!
//! Persisted entries reload unchanged, and normalization ignores the scheme,
//! query and fragment of a URL.

use std::collections::BTreeMap;
use std::sync::Arc;

use autorefresh::database::{Database, Storage};
use autorefresh::managers::url_memory::{normalize_url, UrlMemory, UrlMemoryTrait};
use autorefresh::types::memory::UserSettings;
use proptest::prelude::*;

fn arb_user_settings() -> impl Strategy<Value = UserSettings> {
    (
        -1i64..=1440,
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(period, randomize, smart, only_on_error, sticky_reload, no_cache)| UserSettings {
                period,
                randomize,
                smart,
                only_on_error,
                sticky_reload,
                no_cache,
                remember: true,
            },
        )
}

fn arb_key() -> impl Strategy<Value = String> {
    ("[a-z]{1,10}", "[a-z0-9/]{0,20}").prop_map(|(host, path)| format!("{}.example/{}", host, path))
}

proptest! {
    #[test]
    fn persisted_entries_reload_unchanged(
        entries in prop::collection::btree_map(arb_key(), arb_user_settings(), 0..20)
    ) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let mut memory = UrlMemory::new(Storage::new(db.clone()));
        for (url, settings) in &entries {
            memory.store(url.clone(), settings.clone());
        }
        memory.persist().unwrap();

        let mut reloaded = UrlMemory::new(Storage::new(db));
        prop_assert_eq!(reloaded.load().unwrap(), entries.len());
        let back: BTreeMap<String, UserSettings> =
            reloaded.entries().map(|(k, v)| (k.clone(), v.clone())).collect();
        prop_assert_eq!(back, entries);
    }

    #[test]
    fn normalization_ignores_scheme_query_and_fragment(
        host in "[a-z]{1,10}\\.[a-z]{2,3}",
        path in "(/[a-z0-9]{1,8}){0,4}",
        query in "[a-z0-9=&]{0,16}",
        fragment in "[a-z0-9]{0,8}",
    ) {
        let plain = normalize_url(&format!("https://{}{}", host, path)).unwrap();
        let decorated = normalize_url(&format!("http://{}{}?{}#{}", host, path, query, fragment)).unwrap();
        prop_assert_eq!(&plain, &decorated);
        prop_assert!(plain.starts_with(&host));
    }
}
