// ============================================================================
// COLLIDER EXTRACTOR — canvas occupancy → closed polygon outlines
// ============================================================================
//
// Recomputed wholesale after every canvas mutation; holes and erasure make
// incremental maintenance brittle, so nothing here is cached. Pipeline:
// binary threshold → small dilation → marching squares → ring stitching →
// pixel-to-world remap.

use std::collections::HashMap;

use image::Rgba;
use rayon::prelude::*;

use crate::canvas::{PixelCanvas, is_player_ink};

/// A closed polygon ring in world coordinates. Holes come out as separate
/// rings; consumers treat the list as an even-odd region.
pub type ColliderShape = Vec<(f32, f32)>;

/// Derive the collision outlines of all player-ink regions.
///
/// Returns an empty list for an empty canvas; extraction has no error
/// states. Coordinates are mapped through the canvas' pixel→world transform.
pub fn extract_colliders(
    canvas: &PixelCanvas,
    enemy_color: Rgba<u8>,
    dilation_passes: u32,
) -> Vec<ColliderShape> {
    let w = canvas.width() as usize;
    let h = canvas.height() as usize;

    let mut mask = threshold(canvas, enemy_color);
    for _ in 0..dilation_passes {
        mask = dilate(&mask, w, h);
    }

    let segments = marching_segments(&mask, w, h);
    let rings = connect_rings(segments);

    let transform = canvas.transform();
    rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(|(x, y)| transform.to_world(x, y))
                .collect()
        })
        .collect()
}

/// Strictly binary solid/empty classification: solid = visible player ink.
/// Enemy-painted pixels are empty as far as physics is concerned.
fn threshold(canvas: &PixelCanvas, enemy_color: Rgba<u8>) -> Vec<bool> {
    let w = canvas.width() as usize;
    let raw = canvas.pixels().as_raw();
    let mut mask = vec![false; w * canvas.height() as usize];
    mask.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let base = y * w * 4;
        for (x, m) in row.iter_mut().enumerate() {
            let o = base + x * 4;
            let p = Rgba([raw[o], raw[o + 1], raw[o + 2], raw[o + 3]]);
            *m = is_player_ink(p, enemy_color);
        }
    });
    mask
}

/// One binary dilation pass: a pixel becomes solid if it or any 4-connected
/// neighbor is solid. Closes single-pixel gaps and degenerate slivers.
fn dilate(mask: &[bool], w: usize, h: usize) -> Vec<bool> {
    let mut out = vec![false; mask.len()];
    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, m) in row.iter_mut().enumerate() {
            let i = y * w + x;
            *m = mask[i]
                || (x > 0 && mask[i - 1])
                || (x + 1 < w && mask[i + 1])
                || (y > 0 && mask[i - w])
                || (y + 1 < h && mask[i + w]);
        }
    });
    out
}

/// Marching squares over the mask, with a virtual empty border so contours
/// always close at the canvas edge. Emits undirected boundary segments with
/// vertices at cell-edge midpoints.
fn marching_segments(mask: &[bool], w: usize, h: usize) -> Vec<((f32, f32), (f32, f32))> {
    let sample = |x: i32, y: i32| -> bool {
        x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h && mask[y as usize * w + x as usize]
    };

    let mut segs = Vec::new();
    for y in -1..h as i32 {
        for x in -1..w as i32 {
            let tl = sample(x, y) as u8;
            let tr = sample(x + 1, y) as u8;
            let br = sample(x + 1, y + 1) as u8;
            let bl = sample(x, y + 1) as u8;
            let case = tl | tr << 1 | br << 2 | bl << 3;
            if case == 0 || case == 15 {
                continue;
            }

            let xf = x as f32;
            let yf = y as f32;
            let t = (xf + 0.5, yf);
            let r = (xf + 1.0, yf + 0.5);
            let b = (xf + 0.5, yf + 1.0);
            let l = (xf, yf + 0.5);

            match case {
                1 | 14 => segs.push((t, l)),
                2 | 13 => segs.push((t, r)),
                3 | 12 => segs.push((l, r)),
                4 | 11 => segs.push((r, b)),
                6 | 9 => segs.push((t, b)),
                7 | 8 => segs.push((l, b)),
                // Ambiguous saddles: two opposite corners solid.
                5 => {
                    segs.push((t, l));
                    segs.push((r, b));
                }
                10 => {
                    segs.push((t, r));
                    segs.push((l, b));
                }
                _ => {}
            }
        }
    }
    segs
}

/// Quantize a midpoint vertex for exact endpoint matching. All coordinates
/// are multiples of 0.5, so doubling gives integer keys.
#[inline]
fn vertex_key(p: (f32, f32)) -> (i64, i64) {
    ((p.0 * 2.0).round() as i64, (p.1 * 2.0).round() as i64)
}

/// Stitch undirected segments into closed rings by walking shared endpoints.
/// Chains that fail to close (which a well-formed mask never produces) are
/// dropped.
fn connect_rings(segments: Vec<((f32, f32), (f32, f32))>) -> Vec<Vec<(f32, f32)>> {
    let mut by_endpoint: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, &(a, b)) in segments.iter().enumerate() {
        by_endpoint.entry(vertex_key(a)).or_default().push(i);
        by_endpoint.entry(vertex_key(b)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (a, b) = segments[start];
        let start_key = vertex_key(a);
        let mut ring = vec![a, b];
        let mut cursor = vertex_key(b);
        let mut closed = false;

        loop {
            if cursor == start_key {
                ring.pop(); // the walk re-reached the start vertex
                closed = true;
                break;
            }
            let Some(next) = by_endpoint
                .get(&cursor)
                .and_then(|ids| ids.iter().copied().find(|&i| !used[i]))
            else {
                break;
            };
            used[next] = true;
            let (na, nb) = segments[next];
            let step = if vertex_key(na) == cursor { nb } else { na };
            ring.push(step);
            cursor = vertex_key(step);
        }

        if closed && ring.len() >= 3 {
            rings.push(ring);
        }
    }
    rings
}

/// Even-odd point-in-ring test, for consumers doing hit queries against an
/// extracted shape.
pub fn ring_contains(ring: &[(f32, f32)], x: f32, y: f32) -> bool {
    let mut inside = false;
    let n = ring.len();
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        if (y0 <= y) != (y1 <= y) {
            let xi = x0 + (y - y0) / (y1 - y0) * (x1 - x0);
            if x < xi {
                inside = !inside;
            }
        }
    }
    inside
}
