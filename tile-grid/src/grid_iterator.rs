//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Grid iterators

use crate::address::TileAddress;
use crate::grid::ExtentInt;

/// Level-by-level iterator
pub struct GridIterator {
    level: usize,
    x: u32,
    y: u32,
    limits: Vec<(u8, ExtentInt)>,
    finished: bool,
}

impl GridIterator {
    /// Iterate over the cells of the given levels, in the given order.
    /// Cells are visited top to bottom and left to right, which is address order.
    /// Levels without cells are skipped.
    pub fn new(limits: Vec<(u8, ExtentInt)>) -> GridIterator {
        let limits: Vec<(u8, ExtentInt)> = limits
            .into_iter()
            .filter(|(_, limit)| !limit.is_empty())
            .collect();
        match limits.first() {
            Some((_, limit)) => GridIterator {
                level: 0,
                x: limit.minx,
                y: limit.miny,
                limits: limits.clone(),
                finished: false,
            },
            None => GridIterator {
                level: 0,
                x: 0,
                y: 0,
                limits: Vec::new(),
                finished: true,
            },
        }
    }
}

impl Iterator for GridIterator {
    /// Current cell, zero-based
    type Item = TileAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let (zoom, ref limit) = self.limits[self.level];
        let current = TileAddress::from_cell(zoom, self.x, self.y);
        if self.x < limit.maxx - 1 {
            self.x += 1;
        } else if self.y < limit.maxy - 1 {
            self.y += 1;
            self.x = limit.minx;
        } else if self.level + 1 < self.limits.len() {
            self.level += 1;
            let (_, ref limit) = self.limits[self.level];
            self.x = limit.minx;
            self.y = limit.miny;
        } else {
            self.finished = true;
        }
        Some(current)
    }
}

#[cfg(test)]
fn cells(limits: Vec<(u8, ExtentInt)>) -> Vec<(u8, u32, u32)> {
    GridIterator::new(limits)
        .map(|a| (a.zoom, a.column, a.row))
        .collect()
}

#[test]
fn test_level_iter() {
    use crate::grid::{Extent, Grid};
    let grid = Grid::square(
        256,
        Extent {
            minx: 0.0,
            miny: 0.0,
            maxx: 1000.0,
            maxy: 600.0,
        },
        vec![(0, 4.0), (1, 2.0)],
    );
    // level 0: 250x150 px, level 1: 500x300 px
    assert_eq!(
        cells(grid.tile_limits()),
        vec![
            (0, 0, 0),
            (1, 0, 0),
            (1, 0, 1),
            (1, 1, 0),
            (1, 1, 1),
        ]
    );
    assert_eq!(GridIterator::new(grid.tile_limits()).count(), 5);
}

#[test]
fn test_bad_params() {
    // missing tile_limits
    assert_eq!(cells(Vec::new()), vec![]);

    // empty level in between
    let limits = vec![
        (
            0,
            ExtentInt {
                minx: 0,
                miny: 0,
                maxx: 1,
                maxy: 1,
            },
        ),
        (
            1,
            ExtentInt {
                minx: 0,
                miny: 0,
                maxx: 0,
                maxy: 3,
            },
        ),
        (
            2,
            ExtentInt {
                minx: 0,
                miny: 0,
                maxx: 2,
                maxy: 1,
            },
        ),
    ];
    assert_eq!(cells(limits), vec![(0, 0, 0), (2, 0, 0), (2, 0, 1)]);
}

#[test]
fn test_wide_level() {
    // one row of three tiles
    let limits = vec![(
        3,
        ExtentInt {
            minx: 0,
            miny: 0,
            maxx: 3,
            maxy: 1,
        },
    )];
    assert_eq!(cells(limits), vec![(3, 0, 0), (3, 0, 1), (3, 0, 2)]);
}
