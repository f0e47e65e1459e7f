use std::collections::BTreeMap;

use crate::input::sheet::SheetGrid;
use crate::model::labels::{Assay, SampleLabel};
use crate::model::profile::DesignLayout;
use crate::pipeline::PipelineError;
use crate::plate::WellGrid;

/// Fill color (`RRGGBB`) to gene name, in legend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneLegend {
    pub entries: Vec<(String, String)>,
    by_color: BTreeMap<String, String>,
}

impl GeneLegend {
    pub fn from_entries(entries: Vec<(String, String)>) -> Self {
        let mut by_color = BTreeMap::new();
        for (color, gene) in &entries {
            if let Some(prev) = by_color.insert(color.clone(), gene.clone()) {
                tracing::warn!(color = %color, previous = %prev, gene = %gene, "legend color reused; later gene wins");
            }
        }
        Self { entries, by_color }
    }

    pub fn gene_for(&self, color: &str) -> Option<&str> {
        self.by_color.get(color).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn classify(&self, fill: Option<&str>) -> Assay {
        match fill {
            None => Assay::Empty,
            Some(color) => match self.gene_for(color) {
                Some(gene) => Assay::Gene(gene.to_string()),
                None => Assay::MissingGene,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stage2Output {
    pub samples: WellGrid<SampleLabel>,
    pub genes: WellGrid<Assay>,
    pub legend: GeneLegend,
}

pub fn find_legend_anchor(
    sheet: &SheetGrid,
    layout: &DesignLayout,
) -> Result<(usize, usize), PipelineError> {
    sheet
        .find_marker(&layout.legend_marker)
        .ok_or_else(|| PipelineError::LegendNotFound {
            marker: layout.legend_marker.clone(),
        })
}

/// Reads the contiguous legend row that sits at a fixed offset from the
/// marker cell. The first blank cell ends it.
pub fn read_legend(sheet: &SheetGrid, layout: &DesignLayout) -> Result<GeneLegend, PipelineError> {
    let (marker_row, marker_col) = find_legend_anchor(sheet, layout)?;
    let row = marker_row + layout.legend_row_offset;
    let start_col = marker_col + layout.legend_col_offset;

    let mut entries = Vec::new();
    for col in start_col..=sheet.max_column().max(start_col) {
        let Some(gene) = sheet.value(row, col).map(str::trim).filter(|g| !g.is_empty()) else {
            break;
        };
        let Some(color) = sheet.fill(row, col) else {
            tracing::warn!(row, col, gene, "legend entry has no fill color; legend ends here");
            break;
        };
        entries.push((color.to_string(), gene.to_string()));
    }

    let legend = GeneLegend::from_entries(entries);
    tracing::info!(
        anchor_row = marker_row,
        anchor_col = marker_col,
        genes = legend.len(),
        "gene legend read"
    );
    Ok(legend)
}

pub fn run_stage2(
    sheet: &SheetGrid,
    layout: &DesignLayout,
    negative_label: &str,
) -> Result<Stage2Output, PipelineError> {
    let legend = read_legend(sheet, layout)?;
    if legend.is_empty() {
        tracing::warn!("gene legend is empty; every filled well will be treated as missing_gene");
    }

    let samples = WellGrid::from_fn(|w| {
        let value = sheet.value(layout.origin_row + w.row(), layout.origin_col + w.col());
        SampleLabel::classify(value, negative_label)
    });
    let genes = WellGrid::from_fn(|w| {
        let fill = sheet.fill(layout.origin_row + w.row(), layout.origin_col + w.col());
        legend.classify(fill)
    });

    let n_missing = genes.iter().filter(|(_, g)| **g == Assay::MissingGene).count();
    if n_missing > 0 {
        tracing::debug!(wells = n_missing, "wells filled with a color absent from the legend");
    }

    Ok(Stage2Output {
        samples,
        genes,
        legend,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_design.rs"]
mod tests;
