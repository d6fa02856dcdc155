//! Entity types known to 1.9 and the hierarchy metadata rules are keyed on.

/// Entity types as of 1.9. Object and mob ids share numbers, so the spawn
/// packet family decides which table an id is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Entity,
    LivingEntity,
    Insentient,
    Ageable,
    Animal,
    Tameable,
    Player,

    // objects
    Boat,
    Item,
    AreaEffectCloud,
    Minecart,
    Tnt,
    EnderCrystal,
    Arrow,
    Snowball,
    Egg,
    Fireball,
    SmallFireball,
    EnderPearl,
    WitherSkull,
    ShulkerBullet,
    FallingBlock,
    ItemFrame,
    EyeOfEnder,
    Potion,
    ExperienceBottle,
    Firework,
    LeashKnot,
    ArmorStand,
    FishingHook,
    SpectralArrow,
    TippedArrow,
    DragonFireball,

    // spawned through their own packets
    ExperienceOrb,
    Lightning,
    Painting,

    // mobs
    Creeper,
    Skeleton,
    Spider,
    Giant,
    Zombie,
    Slime,
    Ghast,
    PigZombie,
    Enderman,
    CaveSpider,
    Silverfish,
    Blaze,
    MagmaCube,
    EnderDragon,
    Wither,
    Bat,
    Witch,
    Endermite,
    Guardian,
    Shulker,
    Pig,
    Sheep,
    Cow,
    Chicken,
    Squid,
    Wolf,
    Mooshroom,
    SnowGolem,
    Ocelot,
    IronGolem,
    Horse,
    Rabbit,
    Villager,
}

impl EntityType {
    /// Look up a spawn-object type id.
    pub fn from_object_id(id: i32) -> Option<Self> {
        Some(match id {
            1 => Self::Boat,
            2 => Self::Item,
            3 => Self::AreaEffectCloud,
            10 => Self::Minecart,
            50 => Self::Tnt,
            51 => Self::EnderCrystal,
            60 => Self::Arrow,
            61 => Self::Snowball,
            62 => Self::Egg,
            63 => Self::Fireball,
            64 => Self::SmallFireball,
            65 => Self::EnderPearl,
            66 => Self::WitherSkull,
            67 => Self::ShulkerBullet,
            70 => Self::FallingBlock,
            71 => Self::ItemFrame,
            72 => Self::EyeOfEnder,
            73 => Self::Potion,
            75 => Self::ExperienceBottle,
            76 => Self::Firework,
            77 => Self::LeashKnot,
            78 => Self::ArmorStand,
            90 => Self::FishingHook,
            91 => Self::SpectralArrow,
            92 => Self::TippedArrow,
            93 => Self::DragonFireball,
            _ => return None,
        })
    }

    /// Look up a spawn-mob type id.
    pub fn from_mob_id(id: i32) -> Option<Self> {
        Some(match id {
            50 => Self::Creeper,
            51 => Self::Skeleton,
            52 => Self::Spider,
            53 => Self::Giant,
            54 => Self::Zombie,
            55 => Self::Slime,
            56 => Self::Ghast,
            57 => Self::PigZombie,
            58 => Self::Enderman,
            59 => Self::CaveSpider,
            60 => Self::Silverfish,
            61 => Self::Blaze,
            62 => Self::MagmaCube,
            63 => Self::EnderDragon,
            64 => Self::Wither,
            65 => Self::Bat,
            66 => Self::Witch,
            67 => Self::Endermite,
            68 => Self::Guardian,
            69 => Self::Shulker,
            90 => Self::Pig,
            91 => Self::Sheep,
            92 => Self::Cow,
            93 => Self::Chicken,
            94 => Self::Squid,
            95 => Self::Wolf,
            96 => Self::Mooshroom,
            97 => Self::SnowGolem,
            98 => Self::Ocelot,
            99 => Self::IronGolem,
            100 => Self::Horse,
            101 => Self::Rabbit,
            120 => Self::Villager,
            _ => return None,
        })
    }

    /// Mob id for types spawned through the spawn-mob packet.
    pub fn mob_id(self) -> Option<i32> {
        Some(match self {
            Self::Creeper => 50,
            Self::Skeleton => 51,
            Self::Spider => 52,
            Self::Giant => 53,
            Self::Zombie => 54,
            Self::Slime => 55,
            Self::Ghast => 56,
            Self::PigZombie => 57,
            Self::Enderman => 58,
            Self::CaveSpider => 59,
            Self::Silverfish => 60,
            Self::Blaze => 61,
            Self::MagmaCube => 62,
            Self::EnderDragon => 63,
            Self::Wither => 64,
            Self::Bat => 65,
            Self::Witch => 66,
            Self::Endermite => 67,
            Self::Guardian => 68,
            Self::Shulker => 69,
            Self::Pig => 90,
            Self::Sheep => 91,
            Self::Cow => 92,
            Self::Chicken => 93,
            Self::Squid => 94,
            Self::Wolf => 95,
            Self::Mooshroom => 96,
            Self::SnowGolem => 97,
            Self::Ocelot => 98,
            Self::IronGolem => 99,
            Self::Horse => 100,
            Self::Rabbit => 101,
            Self::Villager => 120,
            _ => return None,
        })
    }

    /// Object id for types spawned through the spawn-object packet.
    pub fn object_id(self) -> Option<i32> {
        (0..=93).find(|&id| Self::from_object_id(id) == Some(self))
    }

    pub fn parent(self) -> Option<Self> {
        use EntityType::*;
        Some(match self {
            Entity => return None,
            LivingEntity => Entity,
            Insentient | Player | ArmorStand => LivingEntity,
            Ageable | Creeper | Skeleton | Spider | Giant | Zombie | Slime | Ghast
            | Enderman | Silverfish | Blaze | EnderDragon | Wither | Bat | Witch | Endermite
            | Guardian | Shulker | Squid | SnowGolem | IronGolem => Insentient,
            Animal | Villager => Ageable,
            Tameable | Pig | Sheep | Cow | Chicken | Horse | Rabbit => Animal,
            Wolf | Ocelot => Tameable,
            Mooshroom => Cow,
            PigZombie => Zombie,
            CaveSpider => Spider,
            MagmaCube => Slime,
            SmallFireball | DragonFireball | WitherSkull => Fireball,
            SpectralArrow | TippedArrow => Arrow,
            _ => Entity,
        })
    }

    /// Walk from this type up to the root, starting with itself.
    pub fn lineage(self) -> impl Iterator<Item = Self> {
        std::iter::successors(Some(self), |t| t.parent())
    }

    pub fn is_or_has_parent(self, ancestor: Self) -> bool {
        self.lineage().any(|t| t == ancestor)
    }

    pub fn is_living(self) -> bool {
        self.is_or_has_parent(Self::LivingEntity)
    }
}
