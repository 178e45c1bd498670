use crate::geometry::Rect;

/// The set of rectangles reported as needing repaint since the last drain.
///
/// Owned exclusively by the content thread. Insertion coalesces greedily:
/// covered rectangles are dropped, covering ones replace what they cover,
/// and two rectangles are merged whenever painting their union is cheaper
/// than painting them separately. The pass is O(n) per insertion and not
/// globally optimal; dirty sets stay small in practice.
#[derive(Debug, Default)]
pub(crate) struct DirtyRegion {
    rects: Vec<Rect>,
}

impl DirtyRegion {
    pub(crate) fn add(&mut self, mut to_paint: Rect) {
        if to_paint.is_empty() {
            return;
        }
        let mut i = 0;
        while i < self.rects.len() {
            let rect = self.rects[i];
            // already covered
            if rect.contains(&to_paint) {
                return;
            }
            // covers an existing one
            if to_paint.contains(&rect) {
                self.rects.remove(i);
                continue;
            }
            let union = rect.union(&to_paint);
            // merge when the union's area is less than the parts' sum
            if union.area() < rect.area() + to_paint.area() {
                self.rects.remove(i);
                to_paint = union; // the grown rect keeps scanning the rest
                continue;
            }
            i += 1;
        }
        self.rects.push(to_paint);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Remove and return the whole set, leaving it empty.
    pub(crate) fn take(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.rects)
    }

    pub(crate) fn clear(&mut self) {
        self.rects.clear();
    }

    pub(crate) fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Shift every rectangle lying wholly inside `region` by `(dx, dy)`.
    /// Used when already-scrolled content carries its pending damage along.
    pub(crate) fn translate_contained(&mut self, region: Rect, dx: i32, dy: i32) {
        for rect in &mut self.rects {
            if region.contains(rect) {
                *rect = rect.translated(dx, dy);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covers_point(region: &DirtyRegion, x: i32, y: i32) -> bool {
        region
            .rects()
            .iter()
            .any(|r| x >= r.x && x < r.right() && y >= r.y && y < r.bottom())
    }

    #[test]
    fn non_positive_rects_are_dropped() {
        let mut region = DirtyRegion::default();
        region.add(Rect::new(0, 0, 0, 10));
        region.add(Rect::new(0, 0, 10, -5));
        assert!(region.is_empty());
    }

    #[test]
    fn coverage_is_a_superset_of_the_inputs() {
        let inputs = [
            Rect::new(0, 0, 10, 10),
            Rect::new(5, 5, 10, 10),
            Rect::new(100, 100, 3, 3),
            Rect::new(8, 0, 30, 4),
            Rect::new(-20, -20, 5, 5),
        ];
        let mut region = DirtyRegion::default();
        for rect in inputs {
            region.add(rect);
        }
        // Every corner and center of every input must still be covered.
        for rect in inputs {
            let xs = [rect.x, rect.x + rect.width / 2, rect.right() - 1];
            let ys = [rect.y, rect.y + rect.height / 2, rect.bottom() - 1];
            for x in xs {
                for y in ys {
                    assert!(covers_point(&region, x, y), "lost coverage of ({x}, {y})");
                }
            }
        }
        for rect in region.rects() {
            assert!(rect.area() > 0);
        }
    }

    #[test]
    fn inserting_the_same_rect_twice_changes_nothing() {
        let mut region = DirtyRegion::default();
        region.add(Rect::new(10, 10, 20, 20));
        region.add(Rect::new(10, 10, 20, 20));
        assert_eq!(region.rects(), &[Rect::new(10, 10, 20, 20)]);
    }

    #[test]
    fn contained_rects_are_pruned_in_either_order() {
        let outer = Rect::new(0, 0, 100, 100);
        let inner = Rect::new(10, 10, 20, 20);

        let mut region = DirtyRegion::default();
        region.add(outer);
        region.add(inner);
        assert_eq!(region.rects(), &[outer]);

        let mut region = DirtyRegion::default();
        region.add(inner);
        region.add(outer);
        assert_eq!(region.rects(), &[outer]);
    }

    #[test]
    fn distant_rects_stay_separate() {
        // Merging two far-apart unit-width columns would blow the area up.
        let mut region = DirtyRegion::default();
        region.add(Rect::new(0, 0, 1, 50));
        region.add(Rect::new(1000, 0, 1, 50));
        assert_eq!(region.rects().len(), 2);
    }

    #[test]
    fn overlapping_rects_merge() {
        let mut region = DirtyRegion::default();
        region.add(Rect::new(0, 0, 20, 20));
        region.add(Rect::new(10, 0, 20, 20));
        assert_eq!(region.rects(), &[Rect::new(0, 0, 30, 20)]);
    }

    #[test]
    fn a_merge_can_enable_further_merges() {
        let mut region = DirtyRegion::default();
        region.add(Rect::new(0, 0, 10, 10));
        region.add(Rect::new(18, 0, 10, 10));
        assert_eq!(region.rects().len(), 2);

        // Bridges the gap: merging with either neighbour makes the union
        // cheap enough to swallow the other as well.
        region.add(Rect::new(8, 0, 12, 10));
        assert_eq!(region.rects(), &[Rect::new(0, 0, 28, 10)]);
    }

    #[test]
    fn translate_contained_moves_only_inner_rects() {
        let mut region = DirtyRegion::default();
        region.add(Rect::new(10, 10, 20, 20));
        region.add(Rect::new(500, 500, 20, 20));

        region.translate_contained(Rect::new(0, 0, 100, 100), 5, 0);
        assert!(region.rects().contains(&Rect::new(15, 10, 20, 20)));
        assert!(region.rects().contains(&Rect::new(500, 500, 20, 20)));
    }
}
