//! A library for raster level grid and tile address calculations
//!
//! ## Level grids
//!
//! Every zoom level renders the same extent at its own ground resolution:
//!
//! ```rust
//! use tile_grid::{Extent, Grid};
//!
//! let grid = Grid::square(
//!     256,
//!     Extent {
//!         minx: 500000.0,
//!         miny: 6500000.0,
//!         maxx: 520000.0,
//!         maxy: 6520000.0,
//!     },
//!     vec![(0, 10.0), (1, 5.0), (2, 2.5)],
//! );
//! assert_eq!(grid.raster_size(2), Some((8000, 8000)));
//! assert_eq!(grid.level_limit(2), Some((32, 32)));
//! ```
//!
//! ## Grid iterators
//!
//! ```rust
//! use tile_grid::{Extent, Grid, GridIterator};
//!
//! let grid = Grid::square(
//!     256,
//!     Extent { minx: 0.0, miny: 0.0, maxx: 5120.0, maxy: 5120.0 },
//!     vec![(0, 10.0)],
//! );
//! for tile in GridIterator::new(grid.tile_limits()) {
//!     println!("Tile {}", tile);
//! }
//! ```
//!
//! ## Native addressing
//!
//! ```rust
//! use tile_grid::{remap, NativeScheme, TileAddress};
//!
//! let scheme = NativeScheme::one_based();
//! let tiles = vec![(TileAddress::new(2, 1, 1), "2_1_1.png")];
//! let remapped = remap(tiles, &scheme).unwrap();
//! assert_eq!(remapped[0].0.filename(), "2x0x0.png");
//! ```

mod address;
mod grid;
mod grid_iterator;

pub use address::{remap, NativeScheme, RemapError, TileAddress};
pub use grid::{pixel_count, tile_count, Extent, ExtentInt, Grid};
pub use grid_iterator::GridIterator;
