use std::fmt;

pub const MISSING_GENE: &str = "missing_gene";
pub const EMPTY: &str = "empty";

/// Sample occupying a well, as written in the design sheet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SampleLabel {
    Empty,
    /// Negative control, carrying the label it was written with.
    Negative(String),
    Named(String),
}

impl SampleLabel {
    pub fn classify(raw: Option<&str>, negative_label: &str) -> Self {
        match raw.map(str::trim) {
            None | Some("") => SampleLabel::Empty,
            Some(s) if s == negative_label => SampleLabel::Negative(s.to_string()),
            Some(s) => SampleLabel::Named(s.to_string()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            SampleLabel::Named(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SampleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleLabel::Empty => f.write_str(EMPTY),
            SampleLabel::Negative(s) | SampleLabel::Named(s) => f.write_str(s),
        }
    }
}

/// Gene assay loaded in a well, resolved from the fill color legend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Assay {
    /// No fill on the design cell.
    Empty,
    /// Filled with a color the legend does not know.
    MissingGene,
    Gene(String),
}

impl Assay {
    pub fn name(&self) -> Option<&str> {
        match self {
            Assay::Gene(g) => Some(g),
            _ => None,
        }
    }
}

impl fmt::Display for Assay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assay::Empty => f.write_str(EMPTY),
            Assay::MissingGene => f.write_str(MISSING_GENE),
            Assay::Gene(g) => f.write_str(g),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssayRole<'a> {
    Reference,
    Target(&'a str),
    Excluded,
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/labels.rs"]
mod tests;
