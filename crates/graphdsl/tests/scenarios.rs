//! End-to-end scenarios: binding, matching, streaming, and transaction
//! lifecycle through the public API.

use std::collections::HashSet;
use std::sync::Arc;

use graphdsl::token::{LabelKind, PropertyKeyKind, RelTypeKind};
use graphdsl::{
    Config, Database, Direction, Entity, Error, Label, LpgStore, NodeId, PropertyName, RelType,
    TokenError, TokenType, TransactionError, Value, token_group,
};

token_group! {
    struct Labels: LabelKind {
        person => "Person",
        company => "Company",
    }
}

token_group! {
    struct Rels: RelTypeKind {
        knows => "KNOWS",
    }
}

token_group! {
    struct Props: PropertyKeyKind {
        name => "name",
    }
}

struct Graph {
    labels: Labels,
    rels: Rels,
    props: Props,
    db: Database,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn open(config: Config) -> Graph {
    init_tracing();
    let labels = Labels::new();
    let rels = Rels::new();
    let props = Props::new();
    let db = Database::with_config(config, &[&labels, &rels, &props]).unwrap();
    Graph {
        labels,
        rels,
        props,
        db,
    }
}

fn id_set(ids: impl IntoIterator<Item = NodeId>) -> HashSet<NodeId> {
    ids.into_iter().collect()
}

#[test]
fn test_token_binding_on_fresh_store() {
    let g = open(Config::in_memory());
    let store = g.db.store();

    let person = g.labels.person.ordinal();
    let company = g.labels.company.ordinal();
    assert_ne!(person, company);
    assert_eq!(store.label_get_or_create("Person").unwrap(), person);
    assert_eq!(store.label_get_or_create("Company").unwrap(), company);
    assert_eq!(
        store.relationship_type_get_or_create("KNOWS").unwrap(),
        g.rels.knows.ordinal()
    );
    assert_eq!(
        store.property_key_get_or_create("name").unwrap(),
        g.props.name.ordinal()
    );
}

#[test]
fn test_token_binding_on_seeded_store() {
    init_tracing();
    let store = Arc::new(LpgStore::new());
    for label in ["A", "B", "C"] {
        store.label_get_or_create(label).unwrap();
    }
    store.relationship_type_get_or_create("DUMMY").unwrap();
    store.property_key_get_or_create("dummy").unwrap();
    store.property_key_get_or_create("dummy2").unwrap();

    let labels = Labels::new();
    let rels = Rels::new();
    let props = Props::new();
    let db = Database::new(Arc::clone(&store), &[&labels, &rels, &props]).unwrap();

    assert_eq!(labels.person.ordinal().as_raw(), 3);
    assert_eq!(rels.knows.ordinal().as_raw(), 1);
    assert_eq!(props.name.ordinal().as_raw(), 2);
    assert_eq!(db.binding().total(), 4);
}

#[test]
fn test_second_database_over_same_store_sees_same_ordinals() {
    init_tracing();
    let store = Arc::new(LpgStore::new());
    store.label_get_or_create("Other").unwrap();

    let first = Labels::new();
    let _db = Database::new(Arc::clone(&store), &[&first]).unwrap();
    let second = Labels::new();
    let _again = Database::new(Arc::clone(&store), &[&second]).unwrap();

    assert_eq!(first.person.ordinal(), second.person.ordinal());
    assert_eq!(first.company.ordinal(), second.company.ordinal());
}

#[test]
fn test_dropped_root_leaves_shared_store_open() {
    init_tracing();
    let store = Arc::new(LpgStore::new());

    let first = Labels::new();
    {
        let _db = Database::new(Arc::clone(&store), &[&first]).unwrap();
    }
    assert!(store.is_open());

    let second = Labels::new();
    let _again = Database::new(Arc::clone(&store), &[&second]).unwrap();
    assert_eq!(first.person.ordinal(), second.person.ordinal());
    assert_eq!(first.company.ordinal(), second.company.ordinal());
}

#[test]
fn test_sibling_root_survives_drop() {
    init_tracing();
    let store = Arc::new(LpgStore::new());
    store.create_node(&["Person"]).unwrap();

    let labels = Labels::new();
    let db = Database::new(Arc::clone(&store), &[&labels]).unwrap();
    let extra = Rels::new();
    drop(Database::new(Arc::clone(&store), &[&extra]).unwrap());

    let tx = db.begin_tx().unwrap();
    assert_eq!(db.r#match(&labels.person).stream().try_count().unwrap(), 1);
    tx.commit().unwrap();
}

#[test]
fn test_explicit_shutdown_closes_shared_store() {
    init_tracing();
    let store = Arc::new(LpgStore::new());
    let labels = Labels::new();
    let db = Database::new(Arc::clone(&store), &[&labels]).unwrap();
    let sibling = Database::new(Arc::clone(&store), &[]).unwrap();

    db.shutdown();
    assert!(!store.is_open());
    assert!(matches!(sibling.begin_tx(), Err(Error::DatabaseClosed)));
}

#[test]
fn test_match_by_id() {
    let g = open(Config::in_memory());
    let n = g.db.store().create_node(&[]).unwrap();
    g.db.store().create_node(&[]).unwrap();

    let _tx = g.db.begin_tx().unwrap();
    let found = g.db.r#match(n).stream().try_collect().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), n);
}

#[test]
fn test_match_by_label() {
    let g = open(Config::in_memory());
    let n = g.db.store().create_node(&["Person"]).unwrap();
    g.db.store().create_node(&[]).unwrap();

    let _tx = g.db.begin_tx().unwrap();
    let ids = g.db.r#match(&g.labels.person).stream().ids().unwrap();
    assert_eq!(ids, vec![n]);
}

#[test]
fn test_match_by_label_and_property() {
    let g = open(Config::in_memory());
    g.db.store().create_node(&["Person"]).unwrap();
    let m = g
        .db
        .store()
        .create_node_with_props(&["Person"], [("name", "Michael")])
        .unwrap();

    let _tx = g.db.begin_tx().unwrap();
    let ids = g
        .db
        .r#match(&g.labels.person)
        .property(&g.props.name, "Michael")
        .stream()
        .ids()
        .unwrap();
    assert_eq!(ids, vec![m]);
}

#[test]
fn test_full_scan() {
    let g = open(Config::in_memory());
    g.db.store().create_node(&[]).unwrap();
    g.db.store().create_node(&["Person"]).unwrap();

    let _tx = g.db.begin_tx().unwrap();
    assert_eq!(g.db.stream().try_count().unwrap(), 2);
}

#[test]
fn test_empty_matches() {
    let g = open(Config::in_memory());

    let _tx = g.db.begin_tx().unwrap();
    assert_eq!(g.db.r#match(&g.labels.person).stream().try_count().unwrap(), 0);
    assert_eq!(g.db.stream().try_count().unwrap(), 0);

    let ghost = g.db.r#match(42u64).stream().try_collect().unwrap();
    assert_eq!(ghost.len(), 1);
    assert_eq!(ghost[0].id(), NodeId::new(42));
    assert!(!ghost[0].exists().unwrap());
    assert_eq!(
        ghost[0].has_label(&g.labels.person).unwrap_err(),
        Error::NodeNotFound(NodeId::new(42))
    );
}

#[test]
fn test_id_match_keeps_order_and_duplicates() {
    let g = open(Config::in_memory());
    let a = g.db.store().create_node(&[]).unwrap();
    let b = g.db.store().create_node(&[]).unwrap();

    let _tx = g.db.begin_tx().unwrap();
    let ids = g.db.r#match([b, a, b]).stream().ids().unwrap();
    assert_eq!(ids, vec![b, a, b]);
    let ids = g.db.match_ids(vec![a]).stream().ids().unwrap();
    assert_eq!(ids, vec![a]);
}

#[test]
fn test_label_union_with_overlap() {
    let g = open(Config::in_memory());
    let store = g.db.store();
    let both = store.create_node(&["Person", "Company"]).unwrap();
    let person = store.create_node(&["Person"]).unwrap();
    let company = store.create_node(&["Company"]).unwrap();

    let _tx = g.db.begin_tx().unwrap();
    let ids = g
        .db
        .match_labels(&[&g.labels.person, &g.labels.company])
        .stream()
        .ids()
        .unwrap();
    assert_eq!(ids.len(), 4);
    assert_eq!(ids, vec![both, person, both, company]);
}

#[test]
fn test_handle_has_label_matches_storage() {
    let g = open(Config::in_memory());
    let n = g.db.store().create_node(&["Company"]).unwrap();

    let _tx = g.db.begin_tx().unwrap();
    let node = g.db.r#match(n).stream().first().unwrap().unwrap();
    assert!(node.has_label(&g.labels.company).unwrap());
    assert!(!node.has_label(&g.labels.person).unwrap());
    assert_eq!(node.label_names().unwrap(), vec![Arc::<str>::from("Company")]);
}

#[test]
fn test_index_and_scan_narrowing_agree() {
    let mut results = Vec::new();
    for config in [
        Config::in_memory(),
        Config::in_memory().with_property_index("name"),
    ] {
        let g = open(config);
        let store = g.db.store();
        for (i, name) in ["Ann", "Bob", "Ann", "Cy", "Ann"].iter().enumerate() {
            let label = if i == 2 { "Company" } else { "Person" };
            store
                .create_node_with_props(&[label], [("name", *name)])
                .unwrap();
        }
        store.create_node(&["Person"]).unwrap();

        let _tx = g.db.begin_tx().unwrap();
        let ids = g
            .db
            .r#match(&g.labels.person)
            .property(&g.props.name, "Ann")
            .stream()
            .ids()
            .unwrap();
        results.push(ids);
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0], vec![NodeId::new(0), NodeId::new(4)]);
}

#[test]
fn test_property_narrowing_uses_value_equality() {
    let g = open(Config::in_memory());
    let store = g.db.store();
    store
        .create_node_with_props(&["Person"], [("name", Value::from(1i64))])
        .unwrap();
    let float = store
        .create_node_with_props(&["Person"], [("name", Value::from(1.0))])
        .unwrap();

    let _tx = g.db.begin_tx().unwrap();
    let ids = g
        .db
        .r#match(&g.labels.person)
        .property(&g.props.name, 1.0)
        .stream()
        .ids()
        .unwrap();
    assert_eq!(ids, vec![float]);
}

#[test]
fn test_commit_invalidates_stream_mid_iteration() {
    let g = open(Config::in_memory());
    for _ in 0..3 {
        g.db.store().create_node(&["Person"]).unwrap();
    }

    let tx = g.db.begin_tx().unwrap();
    let tx_id = tx.tx_id();
    let mut stream = g.db.r#match(&g.labels.person).stream();
    let first = stream.next().unwrap().unwrap();
    tx.commit().unwrap();

    assert_eq!(
        stream.next().unwrap().unwrap_err(),
        Error::Transaction(TransactionError::TransactionInvalidated(tx_id))
    );
    assert!(stream.next().is_none());
    assert!(matches!(
        first.labels(),
        Err(Error::Transaction(TransactionError::TransactionInvalidated(_)))
    ));
}

#[test]
fn test_no_active_transaction() {
    let g = open(Config::in_memory());
    g.db.store().create_node(&["Person"]).unwrap();

    let mut stream = g.db.r#match(&g.labels.person).stream();
    assert_eq!(
        stream.next().unwrap().unwrap_err(),
        Error::Transaction(TransactionError::NoActiveTransaction)
    );
    assert!(stream.next().is_none());
}

#[test]
fn test_transaction_is_per_thread() {
    let g = open(Config::in_memory());
    g.db.store().create_node(&["Person"]).unwrap();

    let _tx = g.db.begin_tx().unwrap();
    std::thread::scope(|scope| {
        scope.spawn(|| {
            let err = g.db.stream().try_count().unwrap_err();
            assert_eq!(
                err,
                Error::Transaction(TransactionError::NoActiveTransaction)
            );
            let tx = g.db.begin_tx().unwrap();
            assert_eq!(g.db.stream().try_count().unwrap(), 1);
            tx.commit().unwrap();
        });
    });
    assert_eq!(g.db.stream().try_count().unwrap(), 1);
}

#[test]
fn test_snapshot_ignores_later_nodes() {
    let g = open(Config::in_memory());
    g.db.store().create_node(&["Person"]).unwrap();

    let _tx = g.db.begin_tx().unwrap();
    g.db.store().create_node(&["Person"]).unwrap();
    assert_eq!(g.db.r#match(&g.labels.person).stream().try_count().unwrap(), 1);
    assert_eq!(g.db.stream().try_count().unwrap(), 1);
}

#[test]
fn test_shutdown_invalidates_everything() {
    let g = open(Config::in_memory());
    let n = g.db.store().create_node(&["Person"]).unwrap();

    let _tx = g.db.begin_tx().unwrap();
    let node = g.db.r#match(n).stream().first().unwrap().unwrap();
    let mut stream = g.db.stream();

    g.db.shutdown();
    assert!(!g.db.is_open());
    assert!(matches!(
        node.exists(),
        Err(Error::Transaction(TransactionError::TransactionInvalidated(_)))
    ));
    assert!(matches!(
        stream.next(),
        Some(Err(Error::Transaction(TransactionError::TransactionInvalidated(_))))
    ));
    assert!(matches!(g.db.begin_tx(), Err(Error::DatabaseClosed)));
    assert!(matches!(
        Database::new(Arc::clone(g.db.store()), &[]),
        Err(Error::DatabaseClosed)
    ));
}

#[test]
fn test_unbound_token_errors() {
    let g = open(Config::in_memory());
    let n = g.db.store().create_node(&["Person"]).unwrap();
    let stray_label = Label::new("Stray");
    let stray_key = PropertyName::new("stray");
    let stray_rel = RelType::new("STRAY");

    let _tx = g.db.begin_tx().unwrap();
    let err = g.db.r#match(&stray_label).stream().try_count().unwrap_err();
    assert_eq!(
        err,
        Error::Token(TokenError::TokenUnbound {
            kind: TokenType::Label,
            name: "Stray".to_string(),
        })
    );

    let node = g.db.r#match(n).stream().first().unwrap().unwrap();
    assert!(matches!(
        node.property(&stray_key),
        Err(Error::Token(TokenError::TokenUnbound { .. }))
    ));
    assert!(matches!(
        node.rels_of_type(&[&stray_rel]).next(),
        Some(Err(Error::Token(TokenError::TokenUnbound { .. })))
    ));
}

#[test]
fn test_illegal_token_name_fails_construction() {
    init_tracing();
    let store = Arc::new(LpgStore::new());
    let good = Labels::new();
    let bad = [Label::new("")];

    let err = Database::new(Arc::clone(&store), &[&good, &bad]).unwrap_err();
    assert!(matches!(
        err,
        Error::Token(TokenError::IllegalTokenName { .. })
    ));
    assert!(!good.person.is_bound());
}

#[test]
fn test_relationship_traversal() {
    let g = open(Config::in_memory());
    let store = g.db.store();
    let alice = store
        .create_node_with_props(&["Person"], [("name", "Alice")])
        .unwrap();
    let bob = store
        .create_node_with_props(&["Person"], [("name", "Bob")])
        .unwrap();
    let acme = store.create_node(&["Company"]).unwrap();
    let knows = store.create_edge(alice, bob, "KNOWS").unwrap();
    let back = store.create_edge(bob, alice, "KNOWS").unwrap();
    let employs = store.create_edge(acme, alice, "EMPLOYS").unwrap();
    let selfie = store.create_edge(alice, alice, "KNOWS").unwrap();

    let _tx = g.db.begin_tx().unwrap();
    let node = g
        .db
        .r#match(&g.labels.person)
        .property(&g.props.name, "Alice")
        .stream()
        .first()
        .unwrap()
        .unwrap();

    let rel_ids = |stream: graphdsl::RelationshipStream| {
        stream
            .map(|rel| rel.map(|r| r.id()))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    };

    assert_eq!(
        rel_ids(node.rels_directed(Direction::Outgoing, &[])),
        vec![knows, selfie]
    );
    assert_eq!(
        rel_ids(node.rels_directed(Direction::Incoming, &[])),
        vec![back, employs, selfie]
    );
    // Both lists a self-loop once
    assert_eq!(rel_ids(node.rels()), vec![knows, selfie, back, employs]);
    assert_eq!(
        rel_ids(node.rels_of_type(&[&g.rels.knows])),
        vec![knows, selfie, back]
    );

    let friends: Vec<String> = node
        .rels_directed(Direction::Outgoing, &[&g.rels.knows])
        .map(|rel| {
            let rel = rel?;
            let other = rel.other(&node).expect("endpoint");
            other
                .property_as::<String>(&g.props.name)
                .map(Option::unwrap_or_default)
        })
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(friends, vec!["Bob".to_string(), "Alice".to_string()]);
}

#[test]
fn test_typed_property_access() {
    let g = open(Config::in_memory());
    let n = g
        .db
        .store()
        .create_node_with_props(&["Person"], [("name", 7i64)])
        .unwrap();

    let _tx = g.db.begin_tx().unwrap();
    let node = g.db.r#match(n).stream().first().unwrap().unwrap();
    assert_eq!(node.property_as::<i64>(&g.props.name).unwrap(), Some(7));
    assert_eq!(
        node.property_as::<String>(&g.props.name).unwrap_err(),
        Error::TypeMismatch {
            expected: "STRING".to_string(),
            found: "INT64".to_string(),
        }
    );
    assert_eq!(
        node.property(&g.props.name).unwrap(),
        Some(Value::Int64(7))
    );
}

#[test]
fn test_deleted_node_visibility() {
    let g = open(Config::in_memory());
    let keep = g.db.store().create_node(&["Person"]).unwrap();
    let gone = g.db.store().create_node(&["Person"]).unwrap();

    let before = g.db.begin_tx().unwrap();
    g.db.store().delete_node(gone).unwrap();
    assert_eq!(
        id_set(g.db.r#match(&g.labels.person).stream().ids().unwrap()),
        id_set([keep, gone])
    );
    before.commit().unwrap();

    let _after = g.db.begin_tx().unwrap();
    assert_eq!(g.db.r#match(&g.labels.person).stream().ids().unwrap(), vec![keep]);
    let ghost = g.db.r#match(gone).stream().first().unwrap().unwrap();
    assert_eq!(
        ghost.labels().unwrap_err(),
        Error::NodeNotFound(gone)
    );
}
