use pagemark_core::{
    classify, enrich, Annotation, AnnotationRepository, MemoryAnnotationStore, PageNumber,
    Selector, StoreOutcome,
};
use serde_json::json;

fn page(value: u32) -> PageNumber {
    PageNumber::new(value).unwrap()
}

fn on_page(id: &str, selector: Selector, value: u32) -> Annotation {
    enrich(&Annotation::new(id, vec![selector]), page(value))
}

#[test]
fn bulk_load_with_top_level_page_member() {
    let raw = json!([{
        "id": "a1",
        "target": { "selector": [{ "type": "TextPositionSelector", "start": 0, "end": 5 }] },
        "page": 1
    }]);
    let all: Vec<Annotation> = serde_json::from_value(raw).unwrap();

    let mut store = MemoryAnnotationStore::new();
    store.set_annotations(all);

    let first = store.get_annotations(page(1));
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id.as_str(), "a1");
    assert_eq!(first[0].target.page, Some(page(1)));
    assert!(!first[0].extra.contains_key("page"));
    assert!(store.get_annotations(page(2)).is_empty());
}

#[test]
fn page_queries_return_exact_subset_in_order() {
    let all = vec![
        on_page("a", Selector::text_quote("one"), 2),
        on_page("b", Selector::fragment("xywh=0,0,1,1"), 1),
        on_page("c", Selector::text_position(3, 9), 2),
        Annotation::new("loose", vec![Selector::text_quote("nowhere")]),
        on_page("d", Selector::svg("<svg/>"), 2),
    ];
    let mut store = MemoryAnnotationStore::new();
    store.set_annotations(all.clone());

    for value in 1..=3 {
        let expected: Vec<Annotation> = all
            .iter()
            .filter(|annotation| annotation.resolved_page() == Some(page(value)))
            .cloned()
            .collect();
        assert_eq!(store.get_annotations(page(value)), expected);
    }
    assert_eq!(store.unplaced().len(), 1);
    assert_eq!(store.pages().collect::<Vec<_>>(), vec![page(1), page(2)]);
}

#[test]
fn create_then_delete_restores_previous_page_state() {
    let mut store = MemoryAnnotationStore::new();
    store.set_annotations(vec![on_page("keep", Selector::text_quote("k"), 4)]);
    let before = store.get_annotations(page(4));

    let transient = on_page("tmp", Selector::fragment("xywh=1,2,3,4"), 4);
    assert_eq!(
        store.create_annotation(transient.clone()),
        StoreOutcome::Inserted(page(4))
    );
    assert_eq!(store.delete_annotation(&transient), StoreOutcome::Removed(page(4)));
    assert_eq!(store.delete_annotation(&transient), StoreOutcome::Orphan);
    assert_eq!(store.get_annotations(page(4)), before);
}

#[test]
fn update_across_pages_moves_exactly_once() {
    let mut store = MemoryAnnotationStore::new();
    let previous = on_page("mv", Selector::text_position(0, 2), 1);
    store.set_annotations(vec![previous.clone(), on_page("other", Selector::text_quote("o"), 3)]);

    let updated = enrich(&previous, page(3));
    assert_eq!(
        store.update_annotation(updated.clone(), &previous),
        StoreOutcome::Moved {
            from: page(1),
            to: page(3)
        }
    );

    assert!(store.get_annotations(page(1)).is_empty());
    let third = store.get_annotations(page(3));
    assert_eq!(third.iter().filter(|a| a.id.as_str() == "mv").count(), 1);
    assert_eq!(third.last(), Some(&updated));
    assert_eq!(store.len(), 2);
}

#[test]
fn duplicate_create_and_orphan_update_are_noops() {
    let mut store = MemoryAnnotationStore::new();
    let first = on_page("dup", Selector::text_quote("a"), 1);
    store.create_annotation(first.clone());

    let clash = on_page("dup", Selector::text_quote("b"), 2);
    assert_eq!(store.create_annotation(clash), StoreOutcome::Duplicate(page(1)));
    assert_eq!(store.get_annotations(page(1)), vec![first]);
    assert!(store.get_annotations(page(2)).is_empty());

    let ghost = on_page("ghost", Selector::text_quote("g"), 1);
    assert_eq!(
        store.update_annotation(ghost.clone(), &ghost),
        StoreOutcome::Orphan
    );
    assert_eq!(store.len(), 1);
}

#[test]
fn unpaged_create_is_refused() {
    let mut store = MemoryAnnotationStore::new();
    let floating = Annotation::new("f", vec![Selector::fragment("xywh=0,0,1,1")]);
    assert_eq!(store.create_annotation(floating), StoreOutcome::Unplaced);
    assert!(store.is_empty());
}

#[test]
fn loaded_page_splits_by_modality() {
    let mut store = MemoryAnnotationStore::new();
    let mixed = enrich(
        &Annotation::new(
            "mixed",
            vec![Selector::text_quote("caption"), Selector::fragment("xywh=5,5,5,5")],
        ),
        page(1),
    );
    let relation = enrich(&Annotation::new("link", vec![]), page(1));
    store.set_annotations(vec![
        on_page("t", Selector::text_position(0, 1), 1),
        mixed,
        relation,
    ]);

    let partition = classify(store.get_annotations(page(1)));
    let ids = |list: &[Annotation]| list.iter().map(|a| a.id.to_string()).collect::<Vec<_>>();
    assert_eq!(ids(&partition.text), vec!["t", "link"]);
    assert_eq!(ids(&partition.image), vec!["mixed"]);
}
