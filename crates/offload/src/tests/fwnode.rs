use crate::error::OffloadError;
use crate::fwnode::{FwNode, FwNodeId, FwTree, PropertyValue, ReferenceResolver};

fn tree() -> (FwTree, FwNodeId, FwNodeId) {
    let mut tree = FwTree::new();
    let offload = tree.add(FwNode::new("offload0").with_compatible("vendor,offload"));
    let adc = tree.add(
        FwNode::new("adc0")
            .with_reference("adi,offloads", "offload0")
            .with_property("broken", PropertyValue::U32(3))
            .with_property(
                "dangling",
                PropertyValue::Reference(vec!["missing".to_string()]),
            ),
    );
    (tree, adc, offload)
}

#[test]
fn resolves_reference_by_name() {
    let (tree, adc, offload) = tree();
    assert!(tree.property_present(adc, "adi,offloads"));
    assert!(!tree.property_present(offload, "adi,offloads"));
    assert_eq!(tree.find_reference(adc, "adi,offloads", 0).unwrap(), offload);
    assert_eq!(tree.compatible(offload).as_deref(), Some("vendor,offload"));
    assert_eq!(tree.compatible(adc), None);
}

#[test]
fn bad_references_are_malformed() {
    let (tree, adc, _) = tree();
    let cases = [
        (adc, "adi,offloads", 1),
        (adc, "broken", 0),
        (adc, "dangling", 0),
        (adc, "absent", 0),
        (FwNodeId(99), "adi,offloads", 0),
    ];
    for (node, prop, index) in cases {
        assert!(
            matches!(tree.find_reference(node, prop, index), Err(OffloadError::Malformed(_))),
            "{prop}[{index}] on {node}"
        );
    }
}
