//! Color ↔ entity resolution.
//!
//! A [`ColorEntityMap`] is built once by the caller, then shared read-only
//! across any number of decode passes. [`EntityColorMap`] is its inverse and
//! drives the encoder.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use rgb::RGB8;

use crate::error::{BitmapError, Result};

/// One pixel as stored on disk: blue, green, red.
pub type Color = rgb::alt::BGR<u8>;

/// Pure black, reserved for impassable terrain.
pub const IMPASSABLE_COLOR: Color = Color { b: 0, g: 0, r: 0 };

/// Pure white, reserved for ocean.
pub const OCEAN_COLOR: Color = Color {
    b: 0xFF,
    g: 0xFF,
    r: 0xFF,
};

/// Numeric identifier of a region in the external definitions table.
pub type EntityId = u32;

/// What a pixel belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    /// A region from the definitions table.
    Id(EntityId),
    Impassable,
    Ocean,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Id(id) => write!(f, "entity #{id}"),
            Entity::Impassable => f.write_str("impassable terrain"),
            Entity::Ocean => f.write_str("ocean"),
        }
    }
}

/// Convert a definitions-table RGB triple into on-disk order.
pub fn color_from_rgb(rgb: RGB8) -> Color {
    Color {
        b: rgb.b,
        g: rgb.g,
        r: rgb.r,
    }
}

/// Lookup from pixel color to entity.
///
/// Always holds the two sentinel entries; every other entry comes from
/// [`insert`](Self::insert). Colors and entities are both unique, so the map
/// is always invertible.
#[derive(Debug, Clone)]
pub struct ColorEntityMap {
    by_color: HashMap<Color, Entity>,
    by_entity: HashMap<Entity, Color>,
}

impl ColorEntityMap {
    /// A map holding only the impassable and ocean sentinels.
    pub fn new() -> Self {
        let mut by_color = HashMap::new();
        let mut by_entity = HashMap::new();
        for (color, entity) in [
            (IMPASSABLE_COLOR, Entity::Impassable),
            (OCEAN_COLOR, Entity::Ocean),
        ] {
            by_color.insert(color, entity);
            by_entity.insert(entity, color);
        }
        Self {
            by_color,
            by_entity,
        }
    }

    /// Build from `(id, color)` definition rows.
    pub fn from_definitions<I>(definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (EntityId, RGB8)>,
    {
        let mut map = Self::new();
        for (id, rgb) in definitions {
            map.insert(id, rgb)?;
        }
        Ok(map)
    }

    /// Associate a definitions-table color with a region id.
    ///
    /// Fails if the color already belongs to another entity (sentinels
    /// included) or the id already has a different color.
    pub fn insert(&mut self, id: EntityId, rgb: RGB8) -> Result<()> {
        let color = color_from_rgb(rgb);
        let entity = Entity::Id(id);

        if let Some(&existing) = self.by_entity.get(&entity) {
            if existing == color {
                return Ok(());
            }
            return Err(BitmapError::DuplicateEntity {
                entity,
                existing,
                color,
            });
        }

        match self.by_color.entry(color) {
            Entry::Occupied(e) => Err(BitmapError::DuplicateColor {
                color,
                existing: *e.get(),
                entity,
            }),
            Entry::Vacant(e) => {
                e.insert(entity);
                self.by_entity.insert(entity, color);
                Ok(())
            }
        }
    }

    #[inline]
    pub fn lookup(&self, color: Color) -> Option<Entity> {
        self.by_color.get(&color).copied()
    }

    /// Number of entries, sentinels included.
    pub fn len(&self) -> usize {
        self.by_color.len()
    }

    /// Always `false`: the sentinels are always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The entity → color direction, for encoding.
    pub fn inverse(&self) -> EntityColorMap {
        EntityColorMap {
            by_entity: self.by_entity.clone(),
        }
    }
}

impl Default for ColorEntityMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Lookup from entity back to the color it is painted with.
#[derive(Debug, Clone)]
pub struct EntityColorMap {
    by_entity: HashMap<Entity, Color>,
}

impl EntityColorMap {
    #[inline]
    pub fn color_of(&self, entity: Entity) -> Option<Color> {
        self.by_entity.get(&entity).copied()
    }

    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}
