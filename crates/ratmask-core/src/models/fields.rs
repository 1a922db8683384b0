//! Extracted field data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field keys shared by marker and geometric extraction.
pub mod keys {
    pub const CALL_NUMBER: &str = "numero_chamado";
    pub const CLIENT: &str = "cliente";
    pub const TECHNICIAN: &str = "tecnico";
    pub const ACKNOWLEDGER: &str = "cliente_ciente";
    pub const CONTACT: &str = "contato";
    pub const SUPPORT_ANALYST: &str = "suporte_mam";
    pub const FINAL_TEST: &str = "teste_final";
    pub const PRODUCTIVE: &str = "produtivo";
    pub const BA_NUMBER: &str = "ba_num";
    pub const UNPRODUCTIVE_REASON: &str = "motivo_improdutivo";
    pub const OBSERVATIONS: &str = "observacoes";
    pub const PROBLEM: &str = "problema";
    pub const ACTION: &str = "acao";
    pub const ACCEPTANCE: &str = "aceite";
    pub const EQUIP_TYPE: &str = "equip_tipo";
    pub const EQUIP_SERIAL: &str = "equip_sn";
    pub const EQUIP_MODEL: &str = "equip_modelo";
    pub const EQUIP_STATUS: &str = "equip_status";
}

/// Field key to accumulated value.
///
/// Values for a repeated key are concatenated in order of appearance with a
/// single separating space; nothing is ever overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `key`.
    ///
    /// An empty value only registers the key. No separator is inserted when
    /// the accumulated value is empty or already ends with a space.
    pub fn append(&mut self, key: &str, value: &str) {
        let entry = self.0.entry(key.to_string()).or_default();
        if value.is_empty() {
            return;
        }
        if !entry.is_empty() && !entry.ends_with(' ') {
            entry.push(' ');
        }
        entry.push_str(value);
    }

    /// Value for `key`, empty when absent.
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether `key` is absent or holds only whitespace.
    pub fn is_blank(&self, key: &str) -> bool {
        self.get(key).trim().is_empty()
    }

    /// Set `key` only when it is currently blank.
    pub fn fill_blank(&mut self, key: &str, value: &str) {
        if self.is_blank(key) && !value.is_empty() {
            self.0.insert(key.to_string(), value.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// First equipment entry found in the client equipment list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    /// Equipment type ("Tipo").
    pub kind: String,
    /// Serial number ("S/N").
    pub serial: String,
    /// Model ("Mod").
    pub model: String,
    /// Status phrase.
    pub status: String,
}

impl EquipmentRecord {
    /// True when every sub-field is empty.
    pub fn is_empty(&self) -> bool {
        self.kind.is_empty() && self.serial.is_empty() && self.model.is_empty() && self.status.is_empty()
    }

    /// Write the non-empty sub-fields into a field map.
    pub fn write_to(&self, fields: &mut FieldMap) {
        fields.append(keys::EQUIP_TYPE, &self.kind);
        fields.append(keys::EQUIP_SERIAL, &self.serial);
        fields.append(keys::EQUIP_MODEL, &self.model);
        fields.append(keys::EQUIP_STATUS, &self.status);
    }
}

/// Final test checkbox ("S / N / N/A").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestFlag {
    /// "S": tested with the client equipment.
    Sim,
    /// "N": not tested.
    Nao,
    /// "N/A": not applicable.
    NotApplicable,
}

impl TestFlag {
    /// Parse the marker/checkbox spelling, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let folded = crate::extract::normalize::fold_accents(value.trim()).to_uppercase();
        match folded.as_str() {
            "S" | "SIM" => Some(TestFlag::Sim),
            "N" | "NAO" => Some(TestFlag::Nao),
            "NA" | "N/A" | "N.A." => Some(TestFlag::NotApplicable),
            _ => None,
        }
    }

    /// Canonical field value.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestFlag::Sim => "S",
            TestFlag::Nao => "N",
            TestFlag::NotApplicable => "NA",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_concatenates_in_order() {
        let mut fields = FieldMap::new();
        fields.append("a", "1");
        fields.append("a", "2");
        fields.append("a", "");
        assert_eq!(fields.get("a"), "1 2");
    }

    #[test]
    fn test_append_empty_registers_key() {
        let mut fields = FieldMap::new();
        fields.append("x", "");
        assert!(fields.contains_key("x"));
        fields.append("x", "v");
        assert_eq!(fields.get("x"), "v");
        assert_eq!(fields.get("missing"), "");
    }

    #[test]
    fn test_append_no_double_space() {
        let mut fields = FieldMap::new();
        fields.append("k", "a ");
        fields.append("k", "b");
        assert_eq!(fields.get("k"), "a b");
    }

    #[test]
    fn test_fill_blank() {
        let mut fields = FieldMap::new();
        fields.fill_blank(keys::CONTACT, "219999");
        fields.fill_blank(keys::CONTACT, "000");
        assert_eq!(fields.get(keys::CONTACT), "219999");
    }

    #[test]
    fn test_test_flag_parse() {
        assert_eq!(TestFlag::parse("s"), Some(TestFlag::Sim));
        assert_eq!(TestFlag::parse("Sim"), Some(TestFlag::Sim));
        assert_eq!(TestFlag::parse("N"), Some(TestFlag::Nao));
        assert_eq!(TestFlag::parse("não"), Some(TestFlag::Nao));
        assert_eq!(TestFlag::parse("N/A"), Some(TestFlag::NotApplicable));
        assert_eq!(TestFlag::parse("NA"), Some(TestFlag::NotApplicable));
        assert_eq!(TestFlag::parse(""), None);
        assert_eq!(TestFlag::parse("talvez"), None);
    }
}
