//! End-to-end resolution scenarios over `MemoryBackend`.

#[cfg(test)]
mod resolution_scenarios {
    use parent_localizer::backend::MemoryTable;
    use parent_localizer::{Command, RecordKey, RelationResolver, Resolution};
    use serde_json::json;

    use crate::common::{backend, localizable_table, registry, row, LANGUAGE};

    const CHILD_REGISTRY: &str = r#"
default_relations:
  child:
    parent_field: pid_ref
    children_field: items
"#;

    /// child#5 points at content#10, which has no translation yet: the
    /// parent gets its own localize command and the child is claimed.
    #[test]
    fn test_unlocalized_parent_is_localized_first() {
        let registry = registry(CHILD_REGISTRY);
        let backend = backend(vec![
            (
                "tt_content",
                localizable_table(vec![json!({ "uid": 10, "sys_language_uid": 0 })]),
            ),
            (
                "child",
                localizable_table(vec![json!({ "uid": 5, "pid_ref": 10, "sys_language_uid": 0 })]),
            ),
        ]);

        let resolver = RelationResolver::new(&registry, &backend, &backend, &backend);
        let resolution = resolver
            .resolve(&row(json!({ "uid": 5, "pid_ref": 10 })), LANGUAGE, "child")
            .unwrap();

        assert_eq!(resolution.batch.len(), 1);
        assert_eq!(
            resolution.batch.get(&RecordKey::new("tt_content", 10)),
            Some(&Command::localize(LANGUAGE))
        );
        assert!(!resolution.batch.contains(&RecordKey::new("child", 5)));
        assert!(resolution.implicit.contains("child", 5));
        assert!(!resolution.implicit.contains("tt_content", 10));
        assert!(backend.executed().is_empty());

        assert_eq!(
            resolution.batch.to_command_map(),
            json!({ "tt_content": { "10": { "localize": 2 } } })
        );
    }

    /// Two siblings under an already translated parent share one
    /// inlineSynchronize command, ids in the order they were resolved.
    #[test]
    fn test_siblings_share_inline_synchronize() {
        let registry = registry(CHILD_REGISTRY);
        let backend = backend(vec![(
            "tt_content",
            localizable_table(vec![
                json!({ "uid": 10, "sys_language_uid": 0 }),
                json!({ "uid": 11, "sys_language_uid": 2, "l18n_parent": 10 }),
            ]),
        )])
        .table("child", MemoryTable::localizable("sys_language_uid", "l18n_parent"));

        let siblings = [
            row(json!({ "uid": 6, "pid_ref": 10 })),
            row(json!({ "uid": 5, "pid_ref": 10 })),
        ];
        let resolver = RelationResolver::new(&registry, &backend, &backend, &backend);
        let resolution = resolver.resolve_all(&siblings, LANGUAGE, "child").unwrap();

        assert_eq!(resolution.batch.len(), 1);
        assert_eq!(
            resolution.batch.get(&RecordKey::new("tt_content", 11)),
            Some(&Command::inline_synchronize("items", LANGUAGE, vec![6, 5]))
        );
        assert!(resolution.implicit.contains("child", 5));
        assert!(resolution.implicit.contains("child", 6));
        assert!(resolution.flushed.is_empty());
    }

    /// Resolving into one accumulated resolution call by call gives the same result.
    #[test]
    fn test_resolve_into_accumulates_across_calls() {
        let registry = registry(CHILD_REGISTRY);
        let backend = backend(vec![
            (
                "tt_content",
                localizable_table(vec![json!({ "uid": 11, "sys_language_uid": 2, "l18n_parent": 10 })]),
            ),
            ("child", localizable_table(vec![])),
        ]);
        let resolver = RelationResolver::new(&registry, &backend, &backend, &backend);

        let mut resolution = Resolution::new();
        for uid in [5, 6] {
            resolver
                .resolve_into(
                    &row(json!({ "uid": uid, "pid_ref": 10 })),
                    LANGUAGE,
                    "child",
                    &mut resolution,
                )
                .unwrap();
        }
        // Re-resolving an already listed child does not duplicate its id.
        resolver
            .resolve_into(
                &row(json!({ "uid": 5, "pid_ref": 10 })),
                LANGUAGE,
                "child",
                &mut resolution,
            )
            .unwrap();

        assert_eq!(
            resolution.batch.get(&RecordKey::new("tt_content", 11)),
            Some(&Command::inline_synchronize("items", LANGUAGE, vec![5, 6]))
        );
    }

    /// A second relation to the same translated parent through a different
    /// children field flushes the first command before replacing it.
    #[test]
    fn test_conflicting_children_field_is_flushed() {
        let registry = registry(
            r#"
additional_relations:
  child:
    - parent_table: tx_parent
      parent_field: first_ref
      children_field: first_items
    - parent_table: tx_parent
      parent_field: second_ref
      children_field: second_items
"#,
        );
        let backend = backend(vec![
            (
                "tx_parent",
                localizable_table(vec![
                    json!({ "uid": 7, "sys_language_uid": 0 }),
                    json!({ "uid": 8, "sys_language_uid": 2, "l18n_parent": 7 }),
                ]),
            ),
            ("child", localizable_table(vec![])),
        ]);

        let resolver = RelationResolver::new(&registry, &backend, &backend, &backend);
        let resolution = resolver
            .resolve(
                &row(json!({ "uid": 5, "first_ref": 7, "second_ref": 7 })),
                LANGUAGE,
                "child",
            )
            .unwrap();

        let executed = backend.executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(
            executed[0].get(&RecordKey::new("tx_parent", 8)),
            Some(&Command::inline_synchronize("first_items", LANGUAGE, vec![5]))
        );
        assert_eq!(resolution.flushed, executed);

        assert_eq!(resolution.batch.len(), 1);
        assert_eq!(
            resolution.batch.get(&RecordKey::new("tx_parent", 8)),
            Some(&Command::inline_synchronize("second_items", LANGUAGE, vec![5]))
        );

        // The caller executes the rest; the flushed entry is not repeated.
        resolution.execute_remaining(&backend).unwrap();
        let executed = backend.executed();
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[1], resolution.batch);
    }

    /// A pending localize command on the translated parent is executed
    /// before an inlineSynchronize for a child replaces it.
    #[test]
    fn test_inline_synchronize_replacing_localize_flushes_it() {
        let registry = registry(
            r#"
additional_relations:
  child:
    - parent_table: tx_parent
      parent_field: p_ref
      children_field: items
"#,
        );
        let backend = backend(vec![
            (
                "tx_parent",
                localizable_table(vec![
                    json!({ "uid": 7, "sys_language_uid": 0 }),
                    json!({ "uid": 8, "sys_language_uid": 2, "l18n_parent": 7 }),
                ]),
            ),
            ("child", localizable_table(vec![])),
        ]);
        let resolver = RelationResolver::new(&registry, &backend, &backend, &backend);

        let mut resolution = Resolution::new();
        resolver
            .resolve_into(&row(json!({ "uid": 8 })), LANGUAGE, "tx_parent", &mut resolution)
            .unwrap();
        assert_eq!(
            resolution.batch.get(&RecordKey::new("tx_parent", 8)),
            Some(&Command::localize(LANGUAGE))
        );

        resolver
            .resolve_into(
                &row(json!({ "uid": 5, "p_ref": 7 })),
                LANGUAGE,
                "child",
                &mut resolution,
            )
            .unwrap();

        let executed = backend.executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(
            executed[0].get(&RecordKey::new("tx_parent", 8)),
            Some(&Command::localize(LANGUAGE))
        );
        assert_eq!(resolution.flushed, executed);
        assert_eq!(resolution.batch.len(), 1);
        assert_eq!(
            resolution.batch.get(&RecordKey::new("tx_parent", 8)),
            Some(&Command::inline_synchronize("items", LANGUAGE, vec![5]))
        );
        assert!(resolution.implicit.contains("child", 5));
    }

    /// a#1 -> b#2 -> a#1: the walk terminates and both records end up claimed.
    #[test]
    fn test_cyclic_relations_terminate() {
        let registry = registry(
            r#"
additional_relations:
  table_a:
    - parent_table: table_b
      parent_field: b_ref
      children_field: a_items
  table_b:
    - parent_table: table_a
      parent_field: a_ref
      children_field: b_items
"#,
        );
        let backend = backend(vec![
            (
                "table_a",
                localizable_table(vec![json!({ "uid": 1, "b_ref": 2, "sys_language_uid": 0 })]),
            ),
            (
                "table_b",
                localizable_table(vec![json!({ "uid": 2, "a_ref": 1, "sys_language_uid": 0 })]),
            ),
        ]);

        let resolver = RelationResolver::new(&registry, &backend, &backend, &backend);
        let resolution = resolver
            .resolve(&row(json!({ "uid": 1, "b_ref": 2 })), LANGUAGE, "table_a")
            .unwrap();

        assert!(resolution.batch.is_empty());
        assert!(resolution.implicit.contains("table_a", 1));
        assert!(resolution.implicit.contains("table_b", 2));
        assert!(backend.executed().is_empty());
    }

    /// grandchild -> child -> content: the top ancestor is the only one
    /// needing its own command, everything below is claimed.
    #[test]
    fn test_ancestor_chain_resolved_top_down() {
        let registry = registry(
            r#"
default_relations:
  child:
    parent_field: pid_ref
    children_field: items
additional_relations:
  grandchild:
    - parent_table: child
      parent_field: child_ref
      children_field: grandchildren
"#,
        );
        let backend = backend(vec![
            (
                "tt_content",
                localizable_table(vec![json!({ "uid": 10, "sys_language_uid": 0 })]),
            ),
            (
                "child",
                localizable_table(vec![json!({ "uid": 5, "pid_ref": 10, "sys_language_uid": 0 })]),
            ),
            ("grandchild", localizable_table(vec![])),
        ]);

        let resolver = RelationResolver::new(&registry, &backend, &backend, &backend);
        let resolution = resolver
            .resolve(&row(json!({ "uid": 100, "child_ref": 5 })), LANGUAGE, "grandchild")
            .unwrap();

        let keys: Vec<&RecordKey> = resolution.batch.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec![&RecordKey::new("tt_content", 10)]);
        assert!(resolution.implicit.contains("child", 5));
        assert!(resolution.implicit.contains("grandchild", 100));
        assert_eq!(resolution.implicit.len(), 2);
    }

    /// Default and additional relation point at the same untranslated parent:
    /// the parent is visited once and gets exactly one command.
    #[test]
    fn test_shared_parent_visited_once() {
        let registry = registry(
            r#"
default_relations:
  child:
    parent_field: pid_ref
    children_field: items
additional_relations:
  child:
    - parent_table: tt_content
      parent_field: owner_ref
"#,
        );
        let backend = backend(vec![
            (
                "tt_content",
                localizable_table(vec![json!({ "uid": 10, "sys_language_uid": 0 })]),
            ),
            ("child", localizable_table(vec![])),
        ]);

        let resolver = RelationResolver::new(&registry, &backend, &backend, &backend);
        let resolution = resolver
            .resolve(
                &row(json!({ "uid": 5, "pid_ref": 10, "owner_ref": 10 })),
                LANGUAGE,
                "child",
            )
            .unwrap();

        assert_eq!(resolution.batch.len(), 1);
        assert_eq!(
            resolution.batch.get(&RecordKey::new("tt_content", 10)),
            Some(&Command::localize(LANGUAGE))
        );
        assert!(resolution.implicit.contains("child", 5));
    }

    /// A soft-deleted parent is a dangling reference.
    #[test]
    fn test_deleted_parent_leaves_child_unclaimed() {
        let registry = registry(CHILD_REGISTRY);
        let backend = backend(vec![
            (
                "tt_content",
                localizable_table(vec![json!({ "uid": 10, "sys_language_uid": 0, "deleted": 1 })]),
            ),
            ("child", localizable_table(vec![])),
        ]);

        let resolver = RelationResolver::new(&registry, &backend, &backend, &backend);
        let resolution = resolver
            .resolve(&row(json!({ "uid": 5, "pid_ref": 10 })), LANGUAGE, "child")
            .unwrap();

        assert_eq!(
            resolution.batch.get(&RecordKey::new("child", 5)),
            Some(&Command::localize(LANGUAGE))
        );
        assert!(resolution.implicit.is_empty());
    }

    /// Duplicate translations of the parent: the lowest id is the target.
    #[test]
    fn test_duplicate_parent_translations_use_lowest_id() {
        let registry = registry(CHILD_REGISTRY);
        let backend = backend(vec![
            (
                "tt_content",
                localizable_table(vec![
                    json!({ "uid": 10, "sys_language_uid": 0 }),
                    json!({ "uid": 13, "sys_language_uid": 2, "l18n_parent": 10 }),
                    json!({ "uid": 12, "sys_language_uid": 2, "l18n_parent": 10 }),
                ]),
            ),
            ("child", localizable_table(vec![])),
        ]);

        let resolver = RelationResolver::new(&registry, &backend, &backend, &backend);
        let resolution = resolver
            .resolve(&row(json!({ "uid": 5, "pid_ref": 10 })), LANGUAGE, "child")
            .unwrap();

        assert!(resolution.batch.contains(&RecordKey::new("tt_content", 12)));
        assert!(!resolution.batch.contains(&RecordKey::new("tt_content", 13)));
    }

    /// The child table itself is opaque: nothing is queued.
    #[test]
    fn test_child_in_opaque_table_is_ignored() {
        let registry = registry(CHILD_REGISTRY);
        let mut backend = backend(vec![(
            "tt_content",
            localizable_table(vec![json!({ "uid": 10, "sys_language_uid": 0 })]),
        )]);
        backend.insert_row("child", row(json!({ "uid": 5, "pid_ref": 10 })));

        let resolver = RelationResolver::new(&registry, &backend, &backend, &backend);
        let resolution = resolver
            .resolve(&row(json!({ "uid": 5, "pid_ref": 10 })), LANGUAGE, "child")
            .unwrap();

        assert!(resolution.batch.is_empty());
        assert!(resolution.implicit.is_empty());
    }

    /// Resolution serializes with both effect channels kept apart.
    #[test]
    fn test_resolution_serializes() {
        let registry = registry(CHILD_REGISTRY);
        let backend = backend(vec![
            (
                "tt_content",
                localizable_table(vec![json!({ "uid": 10, "sys_language_uid": 0 })]),
            ),
            ("child", localizable_table(vec![])),
        ]);

        let resolver = RelationResolver::new(&registry, &backend, &backend, &backend);
        let resolution = resolver
            .resolve(&row(json!({ "uid": 5, "pid_ref": 10 })), LANGUAGE, "child")
            .unwrap();

        let value = serde_json::to_value(&resolution).unwrap();
        assert_eq!(
            value,
            json!({
                "batch": { "tt_content": { "10": { "localize": 2 } } },
                "implicit": { "child": [5] },
                "flushed": [],
            })
        );
    }
}
