use crate::blueprint::model::{BuildingKind, Category, Cost, Upgrade};

const HOUSE_COST: Cost = Cost::new(1000, 100, 2);
const ROAD_COST: Cost = Cost::new(500, 50, 1);
const FACTORY_COST: Cost = Cost::new(3000, 200, 5);

const HOUSE_UPGRADE: Upgrade = Upgrade {
    cost: Cost::new(800, 80, 1),
    result: BuildingKind::Neighborhood,
};
const ROAD_UPGRADE: Upgrade = Upgrade {
    cost: Cost::new(400, 30, 1),
    result: BuildingKind::Railway,
};
const FACTORY_UPGRADE: Upgrade = Upgrade {
    cost: Cost::new(2000, 150, 3),
    result: BuildingKind::Office,
};

impl BuildingKind {
    pub const ALL: [BuildingKind; 6] = [
        BuildingKind::House,
        BuildingKind::Neighborhood,
        BuildingKind::Road,
        BuildingKind::Railway,
        BuildingKind::Factory,
        BuildingKind::Office,
    ];

    /// Kinds offered in the build menu.
    pub const BUILDABLE: [BuildingKind; 3] =
        [BuildingKind::House, BuildingKind::Road, BuildingKind::Factory];

    pub fn icon(self) -> &'static str {
        match self {
            BuildingKind::House => "🏠",
            BuildingKind::Neighborhood => "🏘️",
            BuildingKind::Road => "🛣️",
            BuildingKind::Railway => "🛤️",
            BuildingKind::Factory => "🏭",
            BuildingKind::Office => "🏢",
        }
    }

    pub fn from_icon(icon: &str) -> Option<BuildingKind> {
        Self::ALL.into_iter().find(|kind| kind.icon() == icon)
    }

    pub fn category(self) -> Category {
        match self {
            BuildingKind::House | BuildingKind::Neighborhood => Category::Residential,
            BuildingKind::Road | BuildingKind::Railway => Category::Commercial,
            BuildingKind::Factory | BuildingKind::Office => Category::Industrial,
        }
    }

    /// `None` for kinds that can only be reached through an upgrade.
    pub fn build_cost(self) -> Option<Cost> {
        match self {
            BuildingKind::House => Some(HOUSE_COST),
            BuildingKind::Road => Some(ROAD_COST),
            BuildingKind::Factory => Some(FACTORY_COST),
            BuildingKind::Neighborhood | BuildingKind::Railway | BuildingKind::Office => None,
        }
    }

    pub fn upgrade(self) -> Option<Upgrade> {
        match self {
            BuildingKind::House => Some(HOUSE_UPGRADE),
            BuildingKind::Road => Some(ROAD_UPGRADE),
            BuildingKind::Factory => Some(FACTORY_UPGRADE),
            BuildingKind::Neighborhood | BuildingKind::Railway | BuildingKind::Office => None,
        }
    }

    /// The buildable kind this one descends from.
    pub fn base(self) -> BuildingKind {
        match self {
            BuildingKind::House | BuildingKind::Neighborhood => BuildingKind::House,
            BuildingKind::Road | BuildingKind::Railway => BuildingKind::Road,
            BuildingKind::Factory | BuildingKind::Office => BuildingKind::Factory,
        }
    }

    pub fn is_upgraded(self) -> bool {
        self.base() != self
    }

    /// 1 for a freshly built structure, 2 once upgraded.
    pub fn level(self) -> u8 {
        if self.is_upgraded() { 2 } else { 1 }
    }

    /// Total spent to bring a cell to this kind from empty.
    pub fn invested(self) -> Cost {
        let base = self.base();
        let build = base.build_cost().unwrap_or_default();
        match base.upgrade() {
            Some(upgrade) if upgrade.result == self => build + upgrade.cost,
            _ => build,
        }
    }
}

impl std::fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.icon())
    }
}
