//! Page instructions: the declarative recipe for one output document.
//!
//! An instruction list is an ordered sequence of [`PageInstruction`]s;
//! insertion order is the final page order of the assembled document.
//! All indices are 0-based. Client-facing 1-based page numbers are
//! converted at the HTTP boundary, never here.

/// One entry of an instruction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageInstruction {
    /// Copy one page from a loaded source document.
    ///
    /// `rotation` is a delta in degrees, composed additively with the
    /// page's stored `/Rotate` value (modulo 360), not a replacement.
    Copy {
        source: usize,
        page: usize,
        rotation: i32,
    },
    /// Synthesize a blank page of the default page size, with no source.
    Blank,
}

impl PageInstruction {
    pub fn copy(source: usize, page: usize, rotation: i32) -> Self {
        PageInstruction::Copy {
            source,
            page,
            rotation,
        }
    }
}

/// Instructions enumerating every page of one source in order, all with the
/// same rotation delta. This is the merge building block.
pub fn all_pages(source: usize, page_count: usize, rotation: i32) -> Vec<PageInstruction> {
    (0..page_count)
        .map(|page| PageInstruction::copy(source, page, rotation))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_pages_enumerates_in_order() {
        let instructions = all_pages(2, 3, 90);
        assert_eq!(
            instructions,
            vec![
                PageInstruction::copy(2, 0, 90),
                PageInstruction::copy(2, 1, 90),
                PageInstruction::copy(2, 2, 90),
            ]
        );
    }

    #[test]
    fn all_pages_of_empty_source_is_empty() {
        assert!(all_pages(0, 0, 0).is_empty());
    }
}
