//! Known record sources

use std::collections::HashSet;

use lazy_static::lazy_static;

lazy_static! {
    /// Sources whose `source_id` uniquely identifies a work at that publisher
    pub static ref PUBLISHER_SOURCES: HashSet<&'static str> = [
        "ACM",
        "ACL",
        "BioOne",
        "Elsevier",
        "HumanGeneratedMetadata",
        "IEEE",
        "IOP",
        "JSTOR",
        "Nature",
        "OUP",
        "Sage",
        "Springer",
        "SpringerNature",
        "TaylorAndFrancis",
        "Wiley",
    ]
    .into_iter()
    .collect();

    /// Sources produced by PDF metadata extraction
    pub static ref PDF_SOURCES: HashSet<&'static str> = [
        "MergedPDFExtraction",
        "ScienceParseMerged",
        "ScienceParsePlus",
        "Grobid",
    ]
    .into_iter()
    .collect();
}

pub fn is_publisher_source(source: Option<&str>) -> bool {
    source.is_some_and(|s| PUBLISHER_SOURCES.contains(s))
}

pub fn is_pdf_source(source: Option<&str>) -> bool {
    source.is_some_and(|s| PDF_SOURCES.contains(s))
}
