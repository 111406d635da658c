use crate::{
    CriteriaHandle, NamespaceBinding, NormalizeText, PropertyBag, PropertyError, PropertyKey,
    PropertyValue, RelationalSymbol, SymbolMap, UNBOUNDED, ValueKind,
};

#[test]
fn unset_key_reads_default() {
    let bag = PropertyBag::new();

    assert_eq!(bag.int(PropertyKey::MinOccurs), Some(1));
    assert_eq!(bag.int(PropertyKey::MaxOccurs), Some(1));
    assert_eq!(bag.int(PropertyKey::RecursionLimit), Some(10));
    assert_eq!(bag.str(PropertyKey::DocumentEncoding), Some("UTF-8"));
    assert_eq!(bag.normalize(PropertyKey::NormalizeText), NormalizeText::Preserve);
    assert!(!bag.flag(PropertyKey::IsNillable));
    assert!(bag.is_empty());
}

#[test]
fn unset_key_without_default_is_none() {
    let bag = PropertyBag::new();

    assert_eq!(bag.get(PropertyKey::Name), None);
    assert_eq!(bag.str(PropertyKey::ResultSetName), None);
    assert!(bag.str_list(PropertyKey::StagingTables).is_empty());
}

#[test]
fn setting_default_removes_override() {
    let mut bag = PropertyBag::new();
    bag.set(PropertyKey::MaxOccurs, PropertyValue::Int(UNBOUNDED))
        .unwrap();
    assert!(bag.is_overridden(PropertyKey::MaxOccurs));

    bag.set(PropertyKey::MaxOccurs, PropertyValue::Int(1)).unwrap();

    assert!(!bag.is_overridden(PropertyKey::MaxOccurs));
    assert_eq!(bag.int(PropertyKey::MaxOccurs), Some(1));
    assert_eq!(bag, PropertyBag::new());
}

#[test]
fn every_default_round_trips_to_empty_bag() {
    for &key in PropertyKey::ALL {
        let Some(default) = key.default_value() else {
            continue;
        };
        let mut bag = PropertyBag::new();
        bag.set(key, default.clone()).unwrap();

        assert_eq!(bag.get(key), Some(default), "{key}");
        assert!(bag.local(key).is_none(), "{key}");
        assert_eq!(bag, PropertyBag::new(), "{key}");
    }
}

#[test]
fn kind_mismatch_is_rejected() {
    let mut bag = PropertyBag::new();

    let err = bag
        .set(PropertyKey::MinOccurs, PropertyValue::from("one"))
        .unwrap_err();

    assert_eq!(
        err,
        PropertyError::KindMismatch {
            key: PropertyKey::MinOccurs,
            expected: ValueKind::Int,
            found: ValueKind::Str,
        }
    );
    insta::assert_snapshot!(err, @"property `minOccurs` expects a integer value, got a string value");
    assert!(bag.is_empty());
}

#[test]
fn equality_ignores_insertion_order() {
    let mut a = PropertyBag::new();
    a.set(PropertyKey::Name, "item".into()).unwrap();
    a.set(PropertyKey::IsNillable, true.into()).unwrap();

    let mut b = PropertyBag::new();
    b.set(PropertyKey::IsNillable, true.into()).unwrap();
    b.set(PropertyKey::Name, "item".into()).unwrap();

    assert_eq!(a, b);
}

#[test]
fn clear_restores_default() {
    let mut bag = PropertyBag::new();
    bag.set(PropertyKey::RecursionLimit, PropertyValue::Int(3))
        .unwrap();

    let old = bag.clear(PropertyKey::RecursionLimit);

    assert_eq!(old, Some(PropertyValue::Int(3)));
    assert_eq!(bag.int(PropertyKey::RecursionLimit), Some(10));
}

#[test]
fn iter_yields_local_values_in_key_order() {
    let mut bag = PropertyBag::new();
    bag.set(PropertyKey::FormattedDocument, true.into()).unwrap();
    bag.set(PropertyKey::Name, "doc".into()).unwrap();

    let keys: Vec<_> = bag.iter().map(|(k, _)| k.as_str()).collect();

    assert_eq!(keys, ["name", "formattedDocument"]);
    assert_eq!(bag.len(), 2);
}

#[test]
fn key_names_round_trip() {
    for &key in PropertyKey::ALL {
        assert_eq!(key.as_str().parse::<PropertyKey>(), Ok(key));
    }
    assert_eq!(
        "bogus".parse::<PropertyKey>(),
        Err(PropertyError::UnknownKey("bogus".to_owned()))
    );
}

#[test]
fn normalize_text_parses() {
    assert_eq!("collapse".parse(), Ok(NormalizeText::Collapse));
    assert_eq!(
        "squash".parse::<NormalizeText>(),
        Err(PropertyError::UnknownNormalization("squash".to_owned()))
    );
}

#[test]
fn bag_serializes_only_deviations() {
    let mut bag = PropertyBag::new();
    bag.set(PropertyKey::Name, "order".into()).unwrap();
    bag.set(PropertyKey::MaxOccurs, PropertyValue::Int(UNBOUNDED))
        .unwrap();
    bag.set(PropertyKey::MinOccurs, PropertyValue::Int(1)).unwrap();
    bag.set(PropertyKey::NormalizeText, NormalizeText::Collapse.into())
        .unwrap();

    let json = serde_json::to_string(&bag).unwrap();

    insta::assert_snapshot!(json, @r#"{"name":"order","maxOccurs":-1,"normalizeText":"collapse"}"#);
}

#[test]
fn bag_deserializes_by_key_kind() {
    let mut symbols = SymbolMap::new();
    symbols.insert(
        RelationalSymbol::group("orders"),
        RelationalSymbol::group("orders_1"),
    );
    let mut bag = PropertyBag::new();
    bag.set(PropertyKey::Name, "collapse".into()).unwrap();
    bag.set(PropertyKey::NormalizeText, NormalizeText::Replace.into())
        .unwrap();
    bag.set(PropertyKey::SymbolMap, PropertyValue::SymbolMap(symbols))
        .unwrap();
    bag.set(PropertyKey::CriteriaHandle, CriteriaHandle(7).into())
        .unwrap();
    bag.set(
        PropertyKey::Namespace,
        NamespaceBinding::resolved("ns1", "urn:x").into(),
    )
    .unwrap();
    bag.set(
        PropertyKey::StagingTables,
        PropertyValue::StrList(vec!["tmp.a".to_owned()]),
    )
    .unwrap();

    let json = serde_json::to_string(&bag).unwrap();
    let back: PropertyBag = serde_json::from_str(&json).unwrap();

    assert_eq!(back, bag);
}

#[test]
fn bag_deserialize_rejects_wrong_shape() {
    let err = serde_json::from_str::<PropertyBag>(r#"{"minOccurs":"one"}"#).unwrap_err();

    assert!(err.to_string().contains("invalid type"), "{err}");
}
