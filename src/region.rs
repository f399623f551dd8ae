// Cell-space hit testing for interactive areas that should swallow clicks
// instead of spawning blooms (the terminal analogue of "don't bloom on
// buttons or the audio player").

#[derive(Clone, Copy, Debug)]
pub struct Region {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Region {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.x
            && col < self.x.saturating_add(self.width)
            && row >= self.y
            && row < self.y.saturating_add(self.height)
    }
}

#[derive(Default)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, region: Region) {
        self.regions.push(region);
    }

    pub fn hit(&self, col: u16, row: u16) -> bool {
        self.regions.iter().any(|r| r.contains(col, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_contains_is_half_open() {
        let r = Region::new(2, 0, 4, 1);
        assert!(r.contains(2, 0));
        assert!(r.contains(5, 0));
        assert!(!r.contains(6, 0));
        assert!(!r.contains(1, 0));
        assert!(!r.contains(3, 1));
    }

    #[test]
    fn empty_set_hits_nothing() {
        let set = RegionSet::new();
        assert!(!set.hit(0, 0));
    }

    #[test]
    fn set_hits_any_member() {
        let mut set = RegionSet::new();
        set.add(Region::new(0, 0, 10, 1));
        set.add(Region::new(20, 5, 2, 2));
        assert!(set.hit(3, 0));
        assert!(set.hit(21, 6));
        assert!(!set.hit(3, 3));
    }
}
