//! Common regex patterns for RAT field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Inline machine-readable markers: [[FIELD:key=value]]
    pub static ref FIELD_MARKER: Regex = Regex::new(
        r"\[\[FIELD:([^=\]]+)=([^\]]*)\]\]"
    ).unwrap();

    // Normalizer
    pub static ref UNDERSCORE_RUN: Regex = Regex::new(r"_{2,}").unwrap();
    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s{2,}").unwrap();
    pub static ref FILLER_WORDS: Regex = Regex::new(r"(?i)\b(?:Bilhete|Contato)\b").unwrap();
    pub static ref DIGITS_4: Regex = Regex::new(r"[0-9]{4,}").unwrap();
    pub static ref DIGITS_5: Regex = Regex::new(r"[0-9]{5,}").unwrap();

    // Equipment rows: "Tipo: X | S/N: Y | Mod: Z | Status: W"
    pub static ref ROW_TYPE: Regex = Regex::new(r"(?i)\bTipo\s*:\s*([^|]*)").unwrap();
    pub static ref ROW_SERIAL: Regex = Regex::new(r"(?i)\bS\s*/\s*N\s*:\s*([^|]*)").unwrap();
    pub static ref ROW_MODEL: Regex = Regex::new(r"(?i)\bMod(?:elo)?\s*:\s*([^|]*)").unwrap();
    pub static ref ROW_STATUS: Regex = Regex::new(r"(?i)\bStatus\s*:\s*([^|]*)").unwrap();

    // Explicit serial in free text
    pub static ref SERIAL_LABELED: Regex = Regex::new(
        r"(?i)\bS\s*/\s*N\s*[:\-]?\s*([A-Za-z0-9][A-Za-z0-9\-]*)"
    ).unwrap();

    // Mask derivations
    pub static ref PRODUCTIVE_VALUE: Regex = Regex::new(r"(?im)Produtivo:[ \t]*([^\r\n]*)").unwrap();
    pub static ref PRODUCTIVE_LINE: Regex = Regex::new(r"(?im)^.*Produtivo:.*$").unwrap();
    pub static ref ANALYST_PHRASE: Regex = Regex::new(
        r"(?i)[\s\-–]*acompanhad[oa]\s+pel[oa]\s+analista\s+([^\r\n,;.\-–]+)"
    ).unwrap();
    pub static ref BA_MARKER: Regex = Regex::new(r"(?i)\bBA\s*:\s*([0-9]+)").unwrap();
    pub static ref WITH_BA_PREFIX: Regex = Regex::new(r"(?i)^sim-com\s+BA").unwrap();

    // OCR contact recovery
    pub static ref CONTACT_LABELED: Regex = Regex::new(
        r"(?i)(?:contato|telefone|tel\.?)\s*[:\-]?\s*([0-9()+][0-9()+\s\-]{7,})"
    ).unwrap();
}
