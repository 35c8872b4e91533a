//! Deterministic world decoration
//!
//! The map is endless; tiles and decorations are a pure function of tile
//! coordinates. Nothing here affects combat, and decorations never block.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// World units per tile
pub const TILE_SIZE: f32 = 32.0;

/// Decorations never appear within this many tiles of the origin
const SPAWN_CLEAR_TILES: i32 = 4;

/// Integer hash of a tile coordinate
///
/// The final multiply goes through an `f64` product before truncating to 32
/// bits, so the layout matches the double-precision hash the game shipped with.
pub fn hash2(ix: i32, iy: i32) -> u32 {
    let mut n = (ix as u32)
        .wrapping_mul(374_761_393)
        .wrapping_add((iy as u32).wrapping_mul(668_265_263));
    n ^= n >> 13;
    n = mul_f64_u32(n, 1_274_126_177);
    n ^ (n >> 16)
}

/// `(a * b) mod 2^32` with the product rounded to the nearest `f64` first
fn mul_f64_u32(a: u32, b: u32) -> u32 {
    let product = a as f64 * b as f64;
    // Below 2^63, so the cast is exact on an already-integral value
    product as u64 as u32
}

/// Ground tile variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    PathA,
    PathB,
    StoneA,
    StoneB,
    GrassA,
    GrassB,
}

impl TileKind {
    pub fn is_grass(self) -> bool {
        matches!(self, TileKind::GrassA | TileKind::GrassB)
    }
}

/// Two winding paths, clustered stone ruins, grass elsewhere
pub fn tile_kind(tx: i32, ty: i32) -> TileKind {
    let h = hash2(tx, ty);
    let (fx, fy) = (tx as f64, ty as f64);

    let y1 = (fy * 0.55 + (fx * 0.28).sin() * 3.0).floor() as i32;
    let y2 = (fy * 0.45 + (fx * 0.22 + 2.2).sin() * 4.0).floor() as i32;
    let on_path = (ty - y1).abs() <= 1 || (ty - y2).abs() <= 1;
    let odd = h & 1 == 1;

    if on_path {
        return if odd { TileKind::PathA } else { TileKind::PathB };
    }

    let cluster = (hash2(tx / 3, ty / 3) & 255) as f64 / 255.0;
    if cluster > 0.82 && h & 7 == 0 {
        return if odd { TileKind::StoneA } else { TileKind::StoneB };
    }

    if odd { TileKind::GrassA } else { TileKind::GrassB }
}

/// Decoration variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecorKind {
    Bush,
    Flowers,
    Rock,
    Log,
}

impl DecorKind {
    /// Footprint radius (flowers have none)
    pub fn radius(self) -> f32 {
        match self {
            DecorKind::Rock => 14.0,
            DecorKind::Log => 16.0,
            DecorKind::Bush => 18.0,
            DecorKind::Flowers => 0.0,
        }
    }
}

/// Sparse decoration on grass tiles, keeping the spawn area clear
pub fn decor_kind(tx: i32, ty: i32) -> Option<DecorKind> {
    if !tile_kind(tx, ty).is_grass() {
        return None;
    }
    if tx.abs() <= SPAWN_CLEAR_TILES && ty.abs() <= SPAWN_CLEAR_TILES {
        return None;
    }
    let r = (hash2(tx, ty) & 255) as f32 / 255.0;
    match r {
        r if r < 0.04 => Some(DecorKind::Bush),
        r if r < 0.055 => Some(DecorKind::Flowers),
        r if r < 0.060 => Some(DecorKind::Rock),
        r if r < 0.064 => Some(DecorKind::Log),
        _ => None,
    }
}

/// A placed decoration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub kind: DecorKind,
    /// Tile origin plus a small hashed offset
    pub pos: Vec2,
    pub radius: f32,
}

/// Tile containing a world position
pub fn tile_at(pos: Vec2) -> (i32, i32) {
    (
        (pos.x / TILE_SIZE).floor() as i32,
        (pos.y / TILE_SIZE).floor() as i32,
    )
}

/// Decoration of one tile, if any
pub fn decoration(tx: i32, ty: i32) -> Option<Decoration> {
    let kind = decor_kind(tx, ty)?;
    let h = hash2(tx, ty);
    let ox = ((h >> 8) & 7) as f32 - 3.0;
    let oy = ((h >> 12) & 7) as f32 - 3.0;
    Some(Decoration {
        kind,
        pos: Vec2::new(tx as f32 * TILE_SIZE + ox, ty as f32 * TILE_SIZE + oy),
        radius: kind.radius(),
    })
}

/// Decorations overlapping the world rectangle `[min, max]`
pub fn decorations_in(min: Vec2, max: Vec2) -> Vec<Decoration> {
    let (x0, y0) = tile_at(min);
    let (x1, y1) = tile_at(max);
    let mut out = Vec::new();
    for ty in (y0 - 1)..=(y1 + 1) {
        for tx in (x0 - 1)..=(x1 + 1) {
            out.extend(decoration(tx, ty));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic_and_spread() {
        assert_eq!(hash2(3, -7), hash2(3, -7));
        assert_ne!(hash2(0, 1), hash2(1, 0));
        assert_ne!(hash2(10, 10), hash2(10, 11));
    }

    #[test]
    fn test_hash_rounds_like_double_precision() {
        // An exact wrapping multiply gives 2182377942 here
        assert_eq!(hash2(1, 0), 2_182_377_940);
        assert_eq!(hash2(0, 0), 0);
        assert_eq!(hash2(-7, 3), 1_434_744_196);
        assert_eq!(hash2(25, -40), 1_581_473_347);
        assert_eq!(hash2(123, 456), 3_899_980_404);
    }

    #[test]
    fn test_spawn_area_is_clear() {
        for ty in -4..=4 {
            for tx in -4..=4 {
                assert_eq!(decor_kind(tx, ty), None);
            }
        }
    }

    #[test]
    fn test_decor_only_on_grass() {
        for ty in -60..60 {
            for tx in -60..60 {
                if decor_kind(tx, ty).is_some() {
                    assert!(tile_kind(tx, ty).is_grass());
                }
            }
        }
    }

    #[test]
    fn test_world_has_paths_and_decor() {
        let tiles: Vec<_> = (-40..40)
            .flat_map(|ty| (-40..40).map(move |tx| tile_kind(tx, ty)))
            .collect();
        assert!(tiles.iter().any(|t| matches!(t, TileKind::PathA | TileKind::PathB)));
        assert!(tiles.iter().any(|t| t.is_grass()));
        let decor = decorations_in(Vec2::splat(-2000.0), Vec2::splat(2000.0));
        assert!(!decor.is_empty());
    }
}
