//! Erase-page planner.
//!
//! Derives the set of 1 KiB flash pages covering an Image. Enumerates
//! *every* page a Segment touches, not just its first and last — a
//! Segment longer than two pages must not leave its interior pages
//! un-erased just because today's segment cap happens to keep every
//! Segment within two pages.

use crate::constants::PAGE_SIZE;
use crate::image::Image;

fn page_of(addr: u32) -> u32 {
    (addr / PAGE_SIZE) * PAGE_SIZE
}

/// Computes the de-duplicated, first-seen-order list of page base
/// addresses covering every byte of every Segment in `image`.
pub fn plan(image: &Image) -> Vec<u32> {
    let mut pages = Vec::new();
    for seg in &image.segments {
        if seg.bytes.is_empty() {
            continue;
        }
        let first_page = page_of(seg.start_address);
        let last_page = page_of(seg.start_address + seg.bytes.len() as u32 - 1);
        let mut page = first_page;
        loop {
            if !pages.contains(&page) {
                pages.push(page);
            }
            if page >= last_page {
                break;
            }
            page += PAGE_SIZE;
        }
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Segment;

    #[test]
    fn single_segment_single_page() {
        let image = Image {
            segments: vec![Segment {
                start_address: 0,
                bytes: vec![0u8; 8],
            }],
        };
        assert_eq!(plan(&image), vec![0]);
    }

    #[test]
    fn two_segments_same_page_deduplicated() {
        let image = Image {
            segments: vec![
                Segment {
                    start_address: 0,
                    bytes: vec![0x11u8; 8],
                },
                Segment {
                    start_address: 0x100,
                    bytes: vec![0x22u8; 8],
                },
            ],
        };
        assert_eq!(plan(&image), vec![0]);
    }

    #[test]
    fn segment_spanning_three_pages_enumerates_every_page() {
        let image = Image {
            segments: vec![Segment {
                start_address: 0,
                bytes: vec![0xA5u8; 2560], // spans pages 0, 1024, 2048
            }],
        };
        assert_eq!(plan(&image), vec![0, 1024, 2048]);
    }

    #[test]
    fn covers_every_offset_invariant() {
        let image = Image {
            segments: vec![Segment {
                start_address: 512,
                bytes: vec![0xA5u8; 3000],
            }],
        };
        let pages = plan(&image);
        for i in 0..3000u32 {
            let page = page_of(512 + i);
            assert!(pages.contains(&page), "page 0x{page:X} missing from plan");
        }
    }
}
