//! Closing-report ("mask") assembly.
//!
//! The mask always has the same fixed sequence of labeled lines; only the
//! values after each label vary. The optional equipment status line is the
//! single exception.

use std::fmt;

use tracing::debug;

use crate::extract::normalize::{clean, clean_block};
use crate::extract::patterns::{
    ANALYST_PHRASE, BA_MARKER, PRODUCTIVE_LINE, PRODUCTIVE_VALUE, WITH_BA_PREFIX,
};
use crate::models::fields::{FieldMap, TestFlag, keys};

pub const TITLE: &str = "###ENCERRAMENTO DE CPE###";
pub const BANNER: &str = "&&& MAMINFO";

const TESTED_MESSAGE: &str = "Teste final realizado com o CPE do cliente conectado ao circuito, validação de camada 3 concluída.";
const UNTESTED_MESSAGE: &str = "Sem teste final com o CPE do cliente conectado ao circuito no momento do atendimento.";

/// Normalized values the mask is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskInput {
    pub call_number: String,
    pub model: String,
    pub serial: String,
    pub status: String,
    pub acknowledger: String,
    pub support_analyst: String,
    pub technician: String,
    pub final_test: Option<TestFlag>,
    pub contact: String,
    /// Explicit productivity value; when empty it is read from the
    /// observations' `Produtivo:` line.
    pub productive: String,
    /// Explicit BA number; when empty it is read from the corrective action.
    pub ba_number: String,
    pub observations: String,
    pub action: String,
}

impl MaskInput {
    /// Clean every value of an extracted field map.
    ///
    /// Free-text blocks are cleaned line by line so the `Produtivo:` line
    /// can still be told apart from the description.
    pub fn from_fields(fields: &FieldMap) -> Self {
        let get = |key: &str| clean(fields.get(key));
        Self {
            call_number: get(keys::CALL_NUMBER),
            model: get(keys::EQUIP_MODEL),
            serial: get(keys::EQUIP_SERIAL),
            status: get(keys::EQUIP_STATUS),
            acknowledger: get(keys::ACKNOWLEDGER),
            support_analyst: get(keys::SUPPORT_ANALYST),
            technician: get(keys::TECHNICIAN),
            final_test: TestFlag::parse(fields.get(keys::FINAL_TEST)),
            contact: get(keys::CONTACT),
            productive: get(keys::PRODUCTIVE),
            ba_number: get(keys::BA_NUMBER),
            observations: clean_block(fields.get(keys::OBSERVATIONS)),
            action: clean_block(fields.get(keys::ACTION)),
        }
    }
}

/// The finished closing report. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskDocument {
    lines: Vec<String>,
}

impl MaskDocument {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines joined with `\n`; the last line is empty, so the text ends
    /// with a newline.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for MaskDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Value of the observations' `Produtivo:` line, empty when absent.
fn productive_from_observations(observations: &str) -> String {
    PRODUCTIVE_VALUE
        .captures(observations)
        .and_then(|c| c.get(1))
        .map(|m| clean(m.as_str()))
        .unwrap_or_default()
}

/// Name from an "acompanhado pelo analista <name>" phrase.
fn analyst_name(text: &str) -> Option<String> {
    ANALYST_PHRASE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| clean(m.as_str()))
        .filter(|name| !name.is_empty())
}

fn ba_from_action(action: &str) -> String {
    BA_MARKER
        .captures(action)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Productivity line value and the support analyst it implies.
///
/// The analyst phrase is rebuilt at the end of the line from the resolved
/// analyst, so it appears once whether it came from the observations or
/// from `suporte_mam`.
fn productivity(input: &MaskInput) -> (String, String) {
    let raw = if input.productive.is_empty() {
        productive_from_observations(&input.observations)
    } else {
        input.productive.clone()
    };

    let analyst = analyst_name(&raw)
        .or_else(|| analyst_name(&input.observations))
        .unwrap_or_else(|| input.support_analyst.clone());

    let value = clean(&ANALYST_PHRASE.replace_all(&raw, ""));

    let ba = if input.ba_number.is_empty() {
        ba_from_action(&input.action)
    } else {
        input.ba_number.clone()
    };

    let mut line = if WITH_BA_PREFIX.is_match(&value) && !ba.is_empty() {
        format!("sim-com BA ({})", ba)
    } else {
        value
    };
    if !analyst.is_empty() {
        line = format!("{} - acompanhado pelo analista {}", line, analyst);
    }

    (line, analyst)
}

/// Observations without the `Produtivo:` line, flattened to one line.
fn description(observations: &str) -> String {
    let stripped = PRODUCTIVE_LINE.replace_all(observations, "");
    stripped
        .lines()
        .map(clean)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Assemble the closing report.
pub fn build_mask(input: &MaskInput) -> MaskDocument {
    let (productive, analyst) = productivity(input);

    let tested = input.final_test == Some(TestFlag::Sim);
    let (answer, message) = if tested {
        ("sim", TESTED_MESSAGE)
    } else {
        ("não", UNTESTED_MESSAGE)
    };

    let mut lines = vec![
        TITLE.to_string(),
        String::new(),
        BANNER.to_string(),
        String::new(),
        format!("Nº DA RAT: {}", input.call_number),
        format!("CIRCUITO: {}", input.call_number),
        format!("MODELO DO CPE: {}", input.model),
        format!("Nº DE SÉRIE DO CPE: {}", input.serial),
    ];
    if !input.status.is_empty() {
        lines.push(input.status.clone());
    }
    lines.extend([
        format!("CLIENTE NO LOCAL: SR(A) {}", input.acknowledger),
        format!("SUPORTE PELO ANALISTA: {}", analyst),
        format!("REALIZADO PELO TÉCNICO: {}", input.technician),
        format!("FOI REALIZADO TESTE FINAL COM O EQUIPAMENTO DO CLIENTE? {}", answer),
        format!("TESTADO NA REDE GERENCIADA COM: {}", message),
        format!("CONTATO: {}", input.contact),
        "CONFIGURAÇÕES EXECUTADAS:".to_string(),
        format!("PRODUTIVO: {}", productive),
        format!("DESCRIÇÃO: {}", description(&input.observations)),
        String::new(),
    ]);

    debug!("Mask assembled with {} lines", lines.len());
    MaskDocument { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line_starting<'a>(mask: &'a MaskDocument, prefix: &str) -> &'a str {
        mask.lines()
            .iter()
            .find(|l| l.starts_with(prefix))
            .map(String::as_str)
            .unwrap_or_else(|| panic!("no line starting with {prefix:?}"))
    }

    #[test]
    fn test_empty_input_keeps_structure() {
        let mask = build_mask(&MaskInput::default());
        let expected = vec![
            "###ENCERRAMENTO DE CPE###",
            "",
            "&&& MAMINFO",
            "",
            "Nº DA RAT: ",
            "CIRCUITO: ",
            "MODELO DO CPE: ",
            "Nº DE SÉRIE DO CPE: ",
            "CLIENTE NO LOCAL: SR(A) ",
            "SUPORTE PELO ANALISTA: ",
            "REALIZADO PELO TÉCNICO: ",
            "FOI REALIZADO TESTE FINAL COM O EQUIPAMENTO DO CLIENTE? não",
            "TESTADO NA REDE GERENCIADA COM: Sem teste final com o CPE do cliente conectado ao circuito no momento do atendimento.",
            "CONTATO: ",
            "CONFIGURAÇÕES EXECUTADAS:",
            "PRODUTIVO: ",
            "DESCRIÇÃO: ",
            "",
        ];
        assert_eq!(mask.lines(), expected.as_slice());
        assert!(mask.text().ends_with('\n'));
        assert_eq!(mask.to_string(), mask.text());
    }

    #[test]
    fn test_final_test_collapse() {
        for (flag, answer) in [
            (Some(TestFlag::Sim), "sim"),
            (Some(TestFlag::Nao), "não"),
            (Some(TestFlag::NotApplicable), "não"),
            (None, "não"),
        ] {
            let input = MaskInput {
                final_test: flag,
                ..Default::default()
            };
            let mask = build_mask(&input);
            assert_eq!(
                line_starting(&mask, "FOI REALIZADO"),
                format!("FOI REALIZADO TESTE FINAL COM O EQUIPAMENTO DO CLIENTE? {answer}")
            );
        }

        let input = MaskInput {
            final_test: Some(TestFlag::Sim),
            ..Default::default()
        };
        assert!(line_starting(&build_mask(&input), "TESTADO").contains("validação de camada 3 concluída"));
    }

    #[test]
    fn test_productivity_with_ba_from_action() {
        let input = MaskInput {
            observations: "Troca do CPE\nProdutivo: sim-com BA".to_string(),
            action: "Abertura de BA: 987 para o circuito".to_string(),
            ..Default::default()
        };
        let mask = build_mask(&input);
        assert_eq!(line_starting(&mask, "PRODUTIVO:"), "PRODUTIVO: sim-com BA (987)");
        assert_eq!(line_starting(&mask, "DESCRIÇÃO:"), "DESCRIÇÃO: Troca do CPE");
    }

    #[test]
    fn test_productivity_without_ba_number() {
        let input = MaskInput {
            observations: "Produtivo: sim-com BA".to_string(),
            ..Default::default()
        };
        let mask = build_mask(&input);
        assert_eq!(line_starting(&mask, "PRODUTIVO:"), "PRODUTIVO: sim-com BA");
        assert_eq!(line_starting(&mask, "DESCRIÇÃO:"), "DESCRIÇÃO: ");
    }

    #[test]
    fn test_explicit_values_take_precedence() {
        let input = MaskInput {
            productive: "sim-com BA".to_string(),
            ba_number: "555".to_string(),
            observations: "Produtivo: não".to_string(),
            action: "BA: 987".to_string(),
            ..Default::default()
        };
        let mask = build_mask(&input);
        assert_eq!(line_starting(&mask, "PRODUTIVO:"), "PRODUTIVO: sim-com BA (555)");
    }

    #[test]
    fn test_analyst_phrase_overrides_support() {
        let input = MaskInput {
            support_analyst: "Beltrano".to_string(),
            observations: "Cliente ok\nProdutivo: sim - acompanhado pelo analista Joao Souza".to_string(),
            ..Default::default()
        };
        let mask = build_mask(&input);
        assert_eq!(line_starting(&mask, "SUPORTE"), "SUPORTE PELO ANALISTA: Joao Souza");
        assert_eq!(
            line_starting(&mask, "PRODUTIVO:"),
            "PRODUTIVO: sim - acompanhado pelo analista Joao Souza"
        );
        assert_eq!(line_starting(&mask, "DESCRIÇÃO:"), "DESCRIÇÃO: Cliente ok");
    }

    #[test]
    fn test_support_hint_used_without_phrase() {
        let input = MaskInput {
            support_analyst: "Beltrano".to_string(),
            ..Default::default()
        };
        let mask = build_mask(&input);
        assert_eq!(line_starting(&mask, "SUPORTE"), "SUPORTE PELO ANALISTA: Beltrano");
        assert_eq!(
            line_starting(&mask, "PRODUTIVO:"),
            "PRODUTIVO:  - acompanhado pelo analista Beltrano"
        );
    }

    #[test]
    fn test_support_field_reaches_productivity_line() {
        let mut fields = FieldMap::new();
        fields.append(keys::PRODUCTIVE, "sim");
        fields.append(keys::SUPPORT_ANALYST, "Joao");

        let mask = build_mask(&MaskInput::from_fields(&fields));
        assert_eq!(
            line_starting(&mask, "PRODUTIVO:"),
            "PRODUTIVO: sim - acompanhado pelo analista Joao"
        );
        assert_eq!(line_starting(&mask, "SUPORTE"), "SUPORTE PELO ANALISTA: Joao");
    }

    #[test]
    fn test_analyst_phrase_in_explicit_value_is_not_repeated() {
        let input = MaskInput {
            productive: "sim-com BA - acompanhado pelo analista Joao".to_string(),
            ba_number: "987".to_string(),
            ..Default::default()
        };
        let mask = build_mask(&input);
        assert_eq!(
            line_starting(&mask, "PRODUTIVO:"),
            "PRODUTIVO: sim-com BA (987) - acompanhado pelo analista Joao"
        );
    }

    #[test]
    fn test_status_line_only_when_present() {
        let without = build_mask(&MaskInput::default());
        let with = build_mask(&MaskInput {
            status: "Em funcionamento".to_string(),
            ..Default::default()
        });
        assert_eq!(with.lines().len(), without.lines().len() + 1);
        assert_eq!(with.lines()[8], "Em funcionamento");
        assert_eq!(with.lines()[9], "CLIENTE NO LOCAL: SR(A) ");
    }

    #[test]
    fn test_from_fields_cleans_values() {
        let mut fields = FieldMap::new();
        fields.append(keys::CALL_NUMBER, "13456789");
        fields.append(keys::TECHNICIAN, "\"Fulano\"");
        fields.append(keys::CONTACT, "21 99999-0000 ____");
        fields.append(keys::FINAL_TEST, "sim");
        fields.append(keys::OBSERVATIONS, "linha  um\nProdutivo: sim");

        let input = MaskInput::from_fields(&fields);
        assert_eq!(input.call_number, "13456789");
        assert_eq!(input.technician, "Fulano");
        assert_eq!(input.contact, "21 99999-0000");
        assert_eq!(input.final_test, Some(TestFlag::Sim));
        assert_eq!(input.observations, "linha um\nProdutivo: sim");
        assert_eq!(input.model, "");
    }
}
