//! Accepter resolution
//!
//! The inbound `Accepter` list names the sub-resources the requester wants.
//! "All" as the first element is a macro expanding to the full vocabulary;
//! any other list passes through untouched, including names outside the
//! vocabulary (the dispatcher decides what to do with those).

/// Canonical sub-resource vocabulary, in dispatch order
pub const ALL_SUB_RESOURCES: [&str; 7] = [
    "Header",
    "HeaderEquipmentPlant",
    "StrategyPackage",
    "StrategyPackageText",
    "Operation",
    "OperationText",
    "OperationMaterial",
];

/// Resolve the caller-supplied accepter list into the concrete fan-out plan
///
/// An empty list is equivalent to `["All"]`. If the first element is exactly
/// `"All"` (case-sensitive), the whole list is replaced by
/// [`ALL_SUB_RESOURCES`]. Otherwise the list is returned unchanged — no
/// deduplication, reordering, or vocabulary validation.
pub fn resolve_accepter(accepter: &[String]) -> Vec<String> {
    match accepter.first().map(String::as_str) {
        None | Some("All") => ALL_SUB_RESOURCES.iter().map(|s| s.to_string()).collect(),
        Some(_) => accepter.to_vec(),
    }
}
