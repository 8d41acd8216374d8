use serde::{Deserialize, Serialize};

use crate::blueprint::Category;
use crate::city::grid::{Cell, Grid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Residential,
    Commercial,
    Industrial,
}

impl Filter {
    pub const ALL: [Filter; 4] = [
        Filter::All,
        Filter::Residential,
        Filter::Commercial,
        Filter::Industrial,
    ];

    /// Category segment of a route; unknown segments show everything.
    pub fn from_category(segment: &str) -> Filter {
        match segment {
            "residential" => Filter::Residential,
            "commercial" => Filter::Commercial,
            "industrial" => Filter::Industrial,
            _ => Filter::All,
        }
    }

    pub fn category(self) -> Option<Category> {
        match self {
            Filter::All => None,
            Filter::Residential => Some(Category::Residential),
            Filter::Commercial => Some(Category::Commercial),
            Filter::Industrial => Some(Category::Industrial),
        }
    }

    pub fn admits(self, cell: Cell) -> bool {
        match (self.category(), cell) {
            (None, _) | (_, None) => true,
            (Some(category), Some(kind)) => kind.category() == category,
        }
    }
}

/// Copy of `grid` where every building outside `filter` is blanked. The
/// selection is carried over unchanged.
pub fn project(grid: &Grid, filter: Filter) -> Grid {
    let mut view = grid.clone();
    for (position, cell) in grid.iter() {
        if !filter.admits(cell) {
            view.set(position, None);
        }
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::BuildingKind;
    use crate::city::grid::Position;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_grid(rng: &mut StdRng) -> Grid {
        let placements: Vec<_> = Position::all()
            .filter_map(|position| {
                if !rng.random_bool(0.6) {
                    return None;
                }
                let kind = BuildingKind::ALL[rng.random_range(0..BuildingKind::ALL.len())];
                Some((position, kind))
            })
            .collect();
        Grid::from_placements(placements)
    }

    #[test]
    fn test_all_is_identity() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let grid = random_grid(&mut rng);
            assert_eq!(project(&grid, Filter::All), grid);
        }
    }

    #[test]
    fn test_projection_only_keeps_filtered_category() {
        let mut rng = StdRng::seed_from_u64(29);
        for _ in 0..50 {
            let grid = random_grid(&mut rng);
            let before = grid.clone();
            for filter in Filter::ALL {
                let view = project(&grid, filter);
                for (position, cell) in view.iter() {
                    match cell {
                        None => {}
                        Some(kind) => {
                            assert!(filter.admits(Some(kind)));
                            assert_eq!(grid.get(position), Some(kind));
                        }
                    }
                }
            }
            assert_eq!(grid, before);
        }
    }

    #[test]
    fn test_residential_view() {
        let grid = Grid::from_placements([
            (Position::new(0, 0).unwrap(), BuildingKind::House),
            (Position::new(0, 1).unwrap(), BuildingKind::Road),
            (Position::new(0, 2).unwrap(), BuildingKind::Neighborhood),
            (Position::new(0, 3).unwrap(), BuildingKind::Office),
        ]);
        let view = project(&grid, Filter::Residential);
        assert_eq!(view.icons()[0][..4], [Some("🏠"), None, Some("🏘️"), None]);
    }

    #[test]
    fn test_from_category() {
        assert_eq!(Filter::from_category("industrial"), Filter::Industrial);
        assert_eq!(Filter::from_category("commercial"), Filter::Commercial);
        assert_eq!(Filter::from_category("residential"), Filter::Residential);
        assert_eq!(Filter::from_category("all"), Filter::All);
        assert_eq!(Filter::from_category("parks"), Filter::All);
    }
}
