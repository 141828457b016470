//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

mod tileset;


pub use self::tileset::{NativeTileSet, TileSet};
