//! Split policies: partition one document's pages into named output groups.
//!
//! A policy maps a page count to an ordered sequence of named instruction
//! lists; the assembler then produces one document per group. Page numbers in
//! policies are 1-based (the client-facing convention); the instruction lists
//! coming out are 0-based like everything else in the engine.

use crate::error::PageForgeError;
use crate::instruction::PageInstruction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitPolicy {
    /// Chunks of `size` consecutive pages; the last chunk may be shorter.
    FixedSize { size: usize },
    /// 1-based page numbers marking the end of each group. Breakpoints are
    /// sorted ascending before use and the total page count is implicitly
    /// appended as the final breakpoint.
    Ranges { breakpoints: Vec<usize> },
    /// Explicit 1-based page numbers, order- and duplicate-preserving.
    /// With `merge`, all selected pages form one output; without it, each
    /// page becomes its own single-page output.
    Extract { pages: Vec<usize>, merge: bool },
}

/// One output group: its generated filename and the instructions producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub name: String,
    pub instructions: Vec<PageInstruction>,
}

pub fn partition(
    policy: &SplitPolicy,
    page_count: usize,
) -> Result<Vec<Partition>, PageForgeError> {
    let partitions = match policy {
        SplitPolicy::FixedSize { size } => fixed_size(*size, page_count)?,
        SplitPolicy::Ranges { breakpoints } => ranges(breakpoints, page_count)?,
        SplitPolicy::Extract { pages, merge } => extract(pages, *merge, page_count)?,
    };
    if partitions.is_empty() {
        return Err(PageForgeError::InvalidSplit(
            "no output groups produced".into(),
        ));
    }
    Ok(partitions)
}

fn fixed_size(size: usize, page_count: usize) -> Result<Vec<Partition>, PageForgeError> {
    if size < 1 {
        return Err(PageForgeError::InvalidSplit(
            "chunk size must be at least 1".into(),
        ));
    }
    let mut out = Vec::new();
    let mut start = 0;
    while start < page_count {
        let end = (start + size).min(page_count);
        out.push(Partition {
            name: format!("archivo-{}.pdf", out.len() + 1),
            instructions: copy_range(start, end),
        });
        start = end;
    }
    Ok(out)
}

fn ranges(breakpoints: &[usize], page_count: usize) -> Result<Vec<Partition>, PageForgeError> {
    if breakpoints.is_empty() {
        return Err(PageForgeError::InvalidSplit(
            "no range breakpoints given".into(),
        ));
    }
    let mut sorted = breakpoints.to_vec();
    sorted.sort_unstable();
    sorted.push(page_count);

    let mut out = Vec::new();
    let mut previous = 0;
    for breakpoint in sorted {
        let end = breakpoint.min(page_count);
        // Zero-length groups are skipped without consuming a name.
        if previous >= end {
            continue;
        }
        out.push(Partition {
            name: format!("archivo-{}.pdf", out.len() + 1),
            instructions: copy_range(previous, end),
        });
        previous = end;
    }
    Ok(out)
}

fn extract(
    pages: &[usize],
    merge: bool,
    page_count: usize,
) -> Result<Vec<Partition>, PageForgeError> {
    if pages.is_empty() {
        return Err(PageForgeError::InvalidSplit("no pages selected".into()));
    }
    for &page in pages {
        if page < 1 || page > page_count {
            return Err(PageForgeError::InvalidSplit(format!(
                "page {} does not exist (document has {} pages)",
                page, page_count
            )));
        }
    }

    if merge {
        // One output, caller order preserved, duplicates kept.
        return Ok(vec![Partition {
            name: "extracted-pages.pdf".to_string(),
            instructions: pages
                .iter()
                .map(|&page| PageInstruction::copy(0, page - 1, 0))
                .collect(),
        }]);
    }

    // One single-page output per selection, named by the original page
    // number. Two selections of the same page yield two same-named outputs.
    Ok(pages
        .iter()
        .map(|&page| Partition {
            name: format!("page-{}.pdf", page),
            instructions: vec![PageInstruction::copy(0, page - 1, 0)],
        })
        .collect())
}

fn copy_range(start: usize, end: usize) -> Vec<PageInstruction> {
    (start..end)
        .map(|page| PageInstruction::copy(0, page, 0))
        .collect()
}
