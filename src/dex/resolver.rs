use crate::dex::tables::{IndexTables, MethodId};

/// Returns the lowest method id whose declaring type, name and prototype shorty all match.
///
/// A plain scan in id order: duplicated triples are tolerated and the first one wins.
pub(crate) fn find_method(tables: &IndexTables, class_name: &str, method_name: &str, shorty: &str) -> Option<MethodId>
{
    tables.methods.iter().position(|m| {
        tables.type_names[m.class_idx] == class_name
            && tables.strings[m.name_idx] == method_name
            && tables.strings[tables.prototypes[m.proto_idx].shorty_idx] == shorty
    })
}
