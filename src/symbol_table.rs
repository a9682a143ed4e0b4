//! Symbol table: bidirectional text/id mapping for field names, annotations
//! and symbol values.
//!
//! Ids are partitioned into the nine fixed system symbols (sids 1..=9, always
//! available) and local symbols appended behind them. Sid 0 is reserved for
//! "symbol with unknown text". One table per stream segment; tables are not
//! reusable across streams.

use std::rc::Rc;

use crate::FastHashMap;

/// A symbol id. Sid 0 means "known symbol, unknown text".
pub type SymbolId = u64;

/// The nine Ion 1.0 system symbols, sids 1..=9 in this order.
pub const SYSTEM_SYMBOLS: [&str; 9] = [
    "$ion",
    "$ion_1_0",
    "$ion_symbol_table",
    "name",
    "version",
    "imports",
    "symbols",
    "max_id",
    "$ion_shared_symbol_table",
];

/// The text/id resolution surface the codec needs from a symbol table.
pub trait SymbolTable {
    /// Resolves an id to its text, if the id is in range and has known text.
    fn resolve(&self, sid: SymbolId) -> Option<&str>;

    /// Interns `text`, returning its existing or freshly assigned id.
    fn intern(&mut self, text: &str) -> SymbolId;

    /// The largest id currently assigned.
    fn max_id(&self) -> SymbolId;

    /// Looks up the id of `text` without interning it.
    fn find(&self, text: &str) -> Option<SymbolId>;
}

/// Schwelle ab der die lokale Partition von linearer Suche auf HashMap
/// wechselt. Kleine Tabellen (typisch: eine Handvoll Feldnamen) bleiben
/// als Vec-Scan cache-freundlich.
const LOCAL_LINEAR_THRESHOLD: usize = 64;

/// A local symbol table: the system partition plus appended local symbols.
#[derive(Clone, Default)]
pub struct LocalSymbolTable {
    /// Lokale Symbole in Sid-Reihenfolge (Sid = SYSTEM_SYMBOLS.len() + 1 + Index).
    locals: Vec<Rc<str>>,
    /// Lazy angelegtes Lookup ab [`LOCAL_LINEAR_THRESHOLD`] Einträgen.
    lookup: Option<FastHashMap<Rc<str>, usize>>,
}

impl LocalSymbolTable {
    /// Creates a table holding only the system symbols.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with `symbols` interned in order.
    pub fn with_symbols<'a>(symbols: impl IntoIterator<Item = &'a str>) -> Self {
        let mut table = Self::new();
        for text in symbols {
            table.intern(text);
        }
        table
    }

    /// First sid of the local partition.
    #[inline]
    fn first_local_sid() -> SymbolId {
        SYSTEM_SYMBOLS.len() as SymbolId + 1
    }

    fn find_local(&self, text: &str) -> Option<usize> {
        if let Some(map) = &self.lookup {
            map.get(text).copied()
        } else {
            self.locals.iter().position(|e| &**e == text)
        }
    }
}

impl SymbolTable for LocalSymbolTable {
    fn resolve(&self, sid: SymbolId) -> Option<&str> {
        if sid == 0 {
            return None;
        }
        let index = (sid - 1) as usize;
        if index < SYSTEM_SYMBOLS.len() {
            return Some(SYSTEM_SYMBOLS[index]);
        }
        self.locals
            .get(index - SYSTEM_SYMBOLS.len())
            .map(AsRef::as_ref)
    }

    fn intern(&mut self, text: &str) -> SymbolId {
        if let Some(sid) = self.find(text) {
            return sid;
        }
        // Text der Form $<Ziffern> kollidiert mit der Sid-Notation und ist
        // fast immer ein Aufruferfehler (Sid als Text durchgereicht).
        if text.len() > 1
            && text.starts_with('$')
            && text[1..].bytes().all(|b| b.is_ascii_digit())
        {
            log::warn!("interning symbol text {text:?}, which is ambiguous with symbol-id notation");
        }

        let index = self.locals.len();
        let rc: Rc<str> = text.into();

        // HashMap lazy anlegen, sobald die lineare Suche teuer wird
        if self.lookup.is_none() && index + 1 >= LOCAL_LINEAR_THRESHOLD {
            let mut map =
                FastHashMap::with_capacity_and_hasher(index + 1, Default::default());
            for (i, e) in self.locals.iter().enumerate() {
                map.insert(Rc::clone(e), i);
            }
            map.insert(Rc::clone(&rc), index);
            self.lookup = Some(map);
        } else if let Some(map) = &mut self.lookup {
            map.insert(Rc::clone(&rc), index);
        }

        self.locals.push(rc);
        Self::first_local_sid() + index as SymbolId
    }

    fn max_id(&self) -> SymbolId {
        SYSTEM_SYMBOLS.len() as SymbolId + self.locals.len() as SymbolId
    }

    fn find(&self, text: &str) -> Option<SymbolId> {
        if let Some(index) = SYSTEM_SYMBOLS.iter().position(|s| *s == text) {
            return Some(index as SymbolId + 1);
        }
        self.find_local(text)
            .map(|index| Self::first_local_sid() + index as SymbolId)
    }
}

impl core::fmt::Debug for LocalSymbolTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LocalSymbolTable")
            .field("max_id", &self.max_id())
            .field("locals", &self.locals.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_symbols_resolve_without_interning() {
        let table = LocalSymbolTable::new();
        assert_eq!(table.resolve(1), Some("$ion"));
        assert_eq!(table.resolve(4), Some("name"));
        assert_eq!(table.resolve(9), Some("$ion_shared_symbol_table"));
        assert_eq!(table.max_id(), 9);
    }

    #[test]
    fn sid_zero_has_no_text() {
        let table = LocalSymbolTable::new();
        assert_eq!(table.resolve(0), None);
    }

    #[test]
    fn out_of_range_sid_has_no_binding() {
        let table = LocalSymbolTable::new();
        assert_eq!(table.resolve(10), None);
        assert_eq!(table.resolve(u64::MAX), None);
    }

    #[test]
    fn intern_is_idempotent_and_ordered() {
        let mut table = LocalSymbolTable::new();
        let a = table.intern("ann");
        let b = table.intern("ben");
        assert_eq!(a, 10);
        assert_eq!(b, 11);
        assert_eq!(table.intern("ann"), a);
        assert_eq!(table.resolve(a), Some("ann"));
        assert_eq!(table.resolve(b), Some("ben"));
        assert_eq!(table.max_id(), 11);
    }

    #[test]
    fn find_does_not_intern() {
        let mut table = LocalSymbolTable::new();
        assert_eq!(table.find("missing"), None);
        assert_eq!(table.max_id(), 9);
        table.intern("present");
        assert_eq!(table.find("present"), Some(10));
        assert_eq!(table.find("name"), Some(4));
    }

    // Ab der Schwelle muss das Lazy-HashMap dieselben Sids liefern wie
    // die lineare Suche davor.
    #[test]
    fn lookup_survives_threshold_crossing() {
        let mut table = LocalSymbolTable::new();
        let mut sids = Vec::new();
        for i in 0..200 {
            sids.push(table.intern(&format!("sym{i}")));
        }
        for (i, sid) in sids.iter().enumerate() {
            assert_eq!(table.find(&format!("sym{i}")), Some(*sid));
            assert_eq!(table.resolve(*sid), Some(format!("sym{i}").as_str()));
            assert_eq!(table.intern(&format!("sym{i}")), *sid);
        }
    }
}
