//! Autogenerated layout seeding: the four well-known overlays every
//! [`crate::TypeInfo`] gets before any user edits are authored.

use reliquary_graph::ContentType;

use crate::types::{IntWidth, StructLayout, Symbol, SymbolType};

/// Inserts the engine-synthesized GUID/UID/DataID/Name overlays for a type
/// into `layout`, at the offsets `content_type` declares. If the GUID
/// overlay sits at offset 0 and the UID overlay immediately follows a
/// `GUID`-then-`u32` pair, a synthetic `Type` `u32` field is also inserted
/// between them, matching the on-disk layout of most content types.
///
/// All inserted symbols are flagged `auto_generated` so the UI can
/// distinguish them from user entries, and so they are never persisted in
/// a way that would shadow a later user edit.
pub fn seed_autogenerated_layout(content_type: &ContentType, layout: &mut StructLayout) {
    if let Some(offset) = content_type.guid_offset {
        layout.insert(offset, auto(Symbol::new("GUID", SymbolType::Guid)));

        let guid_size = SymbolType::Guid.byte_size();
        if offset == 0 {
            if let Some(uid_offset) = content_type.uid_offset {
                if uid_offset == guid_size + 4 {
                    layout.insert(
                        guid_size,
                        auto(Symbol::new("Type", SymbolType::UInt(IntWidth::W32))),
                    );
                }
            }
        }
    }
    if let Some(offset) = content_type.uid_offset {
        layout.insert(offset, auto(Symbol::new("UID", SymbolType::UInt(IntWidth::W32))));
    }
    if let Some(offset) = content_type.data_id_offset {
        layout.insert(
            offset,
            auto(Symbol::new("DataID", SymbolType::UInt(IntWidth::W32))),
        );
    }
    if let Some(offset) = content_type.name_offset {
        layout.insert(
            offset,
            auto(Symbol::new(
                "Name",
                SymbolType::WString { pointer: true },
            )),
        );
    }
}

fn auto(mut symbol: Symbol) -> Symbol {
    symbol.auto_generated = true;
    symbol
}
