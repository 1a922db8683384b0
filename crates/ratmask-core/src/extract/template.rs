//! Declarative description of the RAT page layout.
//!
//! Every geometric field is a [`FieldDescriptor`]: which page it lives on, the
//! label variants that anchor it, the region read relative to the anchor and
//! how the captured text is normalized. A template revision only needs a new
//! table, which can be loaded from the JSON configuration.

use serde::{Deserialize, Serialize};

use crate::models::fields::keys;
use crate::pdf::Rect;

/// Which page of the report a field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageRole {
    /// Page 1: identification block and checkboxes.
    Identification,
    /// Page 2: free-text blocks and equipment list.
    Report,
}

/// Edge of the label a region is offset from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Region origin is `(label.x1 + dx, label.y0 + dy)`.
    RightOf,
    /// Region origin is `(label.x0 + dx, label.y1 + dy)`.
    Below,
}

/// Reading region relative to a located label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub anchor: Anchor,
    pub dx: f32,
    pub dy: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub const fn right_of(dx: f32, dy: f32, width: f32, height: f32) -> Self {
        Self {
            anchor: Anchor::RightOf,
            dx,
            dy,
            width,
            height,
        }
    }

    pub const fn below(dx: f32, dy: f32, width: f32, height: f32) -> Self {
        Self {
            anchor: Anchor::Below,
            dx,
            dy,
            width,
            height,
        }
    }

    /// Absolute rectangle for a label located at `label`.
    pub fn resolve(&self, label: &Rect) -> Rect {
        let (x, y) = match self.anchor {
            Anchor::RightOf => (label.x1 + self.dx, label.y0 + self.dy),
            Anchor::Below => (label.x0 + self.dx, label.y1 + self.dy),
        };
        Rect::from_origin(x, y, self.width, self.height)
    }
}

/// How the captured text becomes a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// Generic normalizer.
    Text,
    /// First run of 4+ digits (ticket and circuit numbers).
    FirstDigitRun,
    /// First run of 5+ digits (phone numbers).
    DigitsOrClean,
    /// Multi-line free text, cleaned line by line.
    Block,
}

/// A label-anchored field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub key: String,
    pub page: PageRole,
    /// Label variants, tried in order; the first one found wins.
    pub labels: Vec<String>,
    pub region: Region,
    pub strategy: ReadStrategy,
}

impl FieldDescriptor {
    pub fn new(
        key: &str,
        page: PageRole,
        labels: &[&str],
        region: Region,
        strategy: ReadStrategy,
    ) -> Self {
        Self {
            key: key.to_string(),
            page,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            region,
            strategy,
        }
    }
}

/// Horizontal offsets of the three checkbox marks, from the label's right edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckboxOffsets {
    pub sim: f32,
    pub nao: f32,
    pub na: f32,
}

/// A tri-state "S / N / N/A" checkbox read by proximity of an "X" mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckboxDescriptor {
    pub key: String,
    pub page: PageRole,
    pub labels: Vec<String>,
    pub offsets: CheckboxOffsets,
    /// Vertical offset of the candidate points from the label's center.
    #[serde(default)]
    pub dy: f32,
    /// Search radius around each candidate point.
    #[serde(default = "default_radius")]
    pub radius: f32,
}

fn default_radius() -> f32 {
    10.0
}

/// Geometry and lexicons for the client equipment block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentLayout {
    /// Heading variants (accented and unaccented).
    pub headings: Vec<String>,
    /// Horizontal offset of each row band from the heading's left edge.
    pub row_dx: f32,
    /// Offset of the first row band below the heading.
    pub row_dy: f32,
    /// Vertical step between row bands.
    pub row_step: f32,
    pub row_width: f32,
    pub row_height: f32,
    /// Maximum number of row bands scanned.
    pub max_rows: usize,
    /// Area under the heading scanned when no structured row exists.
    pub fallback: Region,
    /// Known model keywords, matched case-insensitively.
    pub model_lexicon: Vec<String>,
    /// Known status phrases, matched accent-insensitively.
    pub status_lexicon: Vec<String>,
    /// Words that are never a serial number.
    pub serial_stoplist: Vec<String>,
}

impl Default for EquipmentLayout {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            headings: strings(&[
                "Equipamentos do Cliente",
                "EQUIPAMENTOS DO CLIENTE",
                "Equipamentos no Cliente",
                "Equipamentos Cliente",
            ]),
            row_dx: -4.0,
            row_dy: 2.0,
            row_step: 14.0,
            row_width: 520.0,
            row_height: 12.0,
            max_rows: 8,
            fallback: Region::below(-4.0, 0.0, 540.0, 260.0),
            model_lexicon: strings(&[
                "ZTE", "Huawei", "Cisco", "Fortigate", "Fortinet", "Mikrotik", "Datacom",
                "Intelbras", "Juniper", "Alcatel", "Nokia", "Aruba", "TP-Link", "Furukawa",
            ]),
            status_lexicon: strings(&[
                "Em funcionamento",
                "Em operação",
                "Instalado",
                "Retirado",
                "Substituído",
                "Com defeito",
                "Defeito",
                "Operacional",
                "Novo",
            ]),
            serial_stoplist: strings(&[
                "EQUIPAMENTOS",
                "EQUIPAMENTO",
                "CLIENTE",
                "STATUS",
                "MODELO",
                "SERIE",
                "SÉRIE",
                "TIPO",
                "S",
                "N",
                "NA",
            ]),
        }
    }
}

/// Complete geometric layout of one template version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateLayout {
    pub version: String,
    /// Call-number label groups, tried in order (ticket, then circuit).
    pub call_number: Vec<FieldDescriptor>,
    pub fields: Vec<FieldDescriptor>,
    pub checkboxes: Vec<CheckboxDescriptor>,
    pub equipment: EquipmentLayout,
}

impl TemplateLayout {
    /// Descriptors read from the given page.
    pub fn fields_on(&self, page: PageRole) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(move |f| f.page == page)
    }

    /// Checkboxes read from the given page.
    pub fn checkboxes_on(&self, page: PageRole) -> impl Iterator<Item = &CheckboxDescriptor> {
        self.checkboxes.iter().filter(move |c| c.page == page)
    }

    /// Built-in layout of the two-page OI CPE report.
    pub fn oi_cpe_v1() -> Self {
        use PageRole::{Identification, Report};
        use ReadStrategy::{Block, DigitsOrClean, FirstDigitRun, Text};

        let line = Region::right_of(4.0, -1.0, 240.0, 14.0);

        Self {
            version: "oi-cpe-v1".to_string(),
            call_number: vec![
                FieldDescriptor::new(
                    keys::CALL_NUMBER,
                    Identification,
                    &["Nº Bilhete", "N° Bilhete", "No Bilhete", "Bilhete", "Nº do Chamado", "Chamado"],
                    line,
                    FirstDigitRun,
                ),
                FieldDescriptor::new(
                    keys::CALL_NUMBER,
                    Identification,
                    &["Designação do Circuito", "Designacao do Circuito", "Circuito"],
                    line,
                    FirstDigitRun,
                ),
            ],
            fields: vec![
                FieldDescriptor::new(
                    keys::TECHNICIAN,
                    Identification,
                    &["Técnico", "Tecnico", "Nome do Técnico", "Nome do Tecnico"],
                    line,
                    Text,
                ),
                FieldDescriptor::new(
                    keys::ACKNOWLEDGER,
                    Identification,
                    &["Cliente Ciente", "Cliente ciente", "Nome do Cliente"],
                    line,
                    Text,
                ),
                FieldDescriptor::new(
                    keys::CONTACT,
                    Identification,
                    &["Contato", "Telefone"],
                    Region::right_of(4.0, -1.0, 160.0, 14.0),
                    DigitsOrClean,
                ),
                FieldDescriptor::new(
                    keys::ACCEPTANCE,
                    Identification,
                    &["Aceitação", "Aceitacao", "Aceite"],
                    Region::right_of(4.0, -1.0, 300.0, 14.0),
                    Text,
                ),
                FieldDescriptor::new(
                    keys::OBSERVATIONS,
                    Report,
                    &["Observações", "Observacoes", "OBSERVAÇÕES", "OBSERVACOES"],
                    Region::below(0.0, 2.0, 520.0, 240.0),
                    Block,
                ),
                FieldDescriptor::new(
                    keys::PROBLEM,
                    Report,
                    &["Problema Encontrado", "PROBLEMA ENCONTRADO"],
                    Region::below(0.0, 2.0, 520.0, 160.0),
                    Block,
                ),
                FieldDescriptor::new(
                    keys::ACTION,
                    Report,
                    &["Ação Corretiva", "Acao Corretiva", "AÇÃO CORRETIVA", "ACAO CORRETIVA"],
                    Region::below(0.0, 2.0, 520.0, 200.0),
                    Block,
                ),
            ],
            checkboxes: vec![CheckboxDescriptor {
                key: keys::FINAL_TEST.to_string(),
                page: Identification,
                labels: vec![
                    "Teste final com equipamento do cliente".to_string(),
                    "Teste Final".to_string(),
                ],
                offsets: CheckboxOffsets {
                    sim: 22.0,
                    nao: 52.0,
                    na: 82.0,
                },
                dy: 0.0,
                radius: default_radius(),
            }],
            equipment: EquipmentLayout::default(),
        }
    }
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self::oi_cpe_v1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_resolve() {
        let label = Rect::new(50.0, 100.0, 90.0, 110.0);

        let right = Region::right_of(4.0, -1.0, 200.0, 14.0).resolve(&label);
        assert_eq!(right, Rect::new(94.0, 99.0, 294.0, 113.0));

        let below = Region::below(0.0, 2.0, 300.0, 100.0).resolve(&label);
        assert_eq!(below, Rect::new(50.0, 112.0, 350.0, 212.0));
    }

    #[test]
    fn test_default_layout_partitions_pages() {
        let layout = TemplateLayout::default();
        assert_eq!(layout.call_number.len(), 2);
        assert!(layout.fields_on(PageRole::Identification).any(|f| f.key == keys::TECHNICIAN));
        assert!(layout.fields_on(PageRole::Report).all(|f| f.strategy == ReadStrategy::Block));
        assert_eq!(layout.checkboxes_on(PageRole::Identification).count(), 1);
    }

    #[test]
    fn test_layout_json_roundtrip_keeps_defaults() {
        let json = r#"{"version": "custom", "equipment": {"max_rows": 3}}"#;
        let layout: TemplateLayout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.version, "custom");
        assert_eq!(layout.equipment.max_rows, 3);
        assert_eq!(layout.equipment.row_step, 14.0);
        assert_eq!(layout.fields, TemplateLayout::default().fields);
    }
}
