//! External contour extraction on binary masks.
//!
//! Foreground components are 8-connected and background is 4-connected,
//! so every foreground blob has exactly one outer boundary. A component is
//! external when it touches background that is reachable from outside the
//! image; blobs nested inside holes of other blobs are skipped.

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Closed boundary polygon, listed clockwise in image coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    pub points: Vec<Point>,
}

impl Contour {
    /// Absolute shoelace area of the boundary polygon.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0i64;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            twice += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
        }
        (twice as f64 / 2.0).abs()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// Clockwise neighbourhood starting west, y grows downward.
const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// Outer boundaries of every external foreground component of `mask`
/// (non-zero = foreground), in raster order of their top-left pixel.
pub fn find_external_contours(mask: &[u8], width: usize, height: usize) -> Vec<Contour> {
    debug_assert_eq!(mask.len(), width * height);
    if mask.is_empty() {
        return Vec::new();
    }
    let outside = outside_background(mask, width, height);
    let mut labelled = vec![false; mask.len()];
    let mut stack = Vec::new();
    let mut contours = Vec::new();

    for idx in 0..mask.len() {
        if mask[idx] == 0 || labelled[idx] {
            continue;
        }
        label_component(mask, width, height, idx, &mut labelled, &mut stack);
        let x = idx % width;
        // The first pixel reached in raster order is the component's
        // top-left; its west neighbour is background.
        let external = x == 0 || outside[idx - 1];
        if external {
            contours.push(trace_boundary(mask, width, height, idx));
        }
    }
    contours
}

/// Marks background pixels 4-connected to the area beyond the image border.
fn outside_background(mask: &[u8], width: usize, height: usize) -> Vec<bool> {
    let mut outside = vec![false; mask.len()];
    let mut stack = Vec::new();
    let seed = |idx: usize, outside: &mut [bool], stack: &mut Vec<usize>| {
        if mask[idx] == 0 && !outside[idx] {
            outside[idx] = true;
            stack.push(idx);
        }
    };
    for x in 0..width {
        seed(x, &mut outside, &mut stack);
        seed((height - 1) * width + x, &mut outside, &mut stack);
    }
    for y in 0..height {
        seed(y * width, &mut outside, &mut stack);
        seed(y * width + width - 1, &mut outside, &mut stack);
    }
    while let Some(idx) = stack.pop() {
        let x = idx % width;
        let y = idx / width;
        if x > 0 {
            seed(idx - 1, &mut outside, &mut stack);
        }
        if x + 1 < width {
            seed(idx + 1, &mut outside, &mut stack);
        }
        if y > 0 {
            seed(idx - width, &mut outside, &mut stack);
        }
        if y + 1 < height {
            seed(idx + width, &mut outside, &mut stack);
        }
    }
    outside
}

fn label_component(
    mask: &[u8],
    width: usize,
    height: usize,
    start: usize,
    labelled: &mut [bool],
    stack: &mut Vec<usize>,
) {
    labelled[start] = true;
    stack.clear();
    stack.push(start);
    while let Some(idx) = stack.pop() {
        let x = (idx % width) as i32;
        let y = (idx / width) as i32;
        for (dx, dy) in NEIGHBOURS {
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                continue;
            }
            let nidx = ny as usize * width + nx as usize;
            if mask[nidx] != 0 && !labelled[nidx] {
                labelled[nidx] = true;
                stack.push(nidx);
            }
        }
    }
}

/// Moore-neighbour tracing from a top-left component pixel.
fn trace_boundary(mask: &[u8], width: usize, height: usize, start_idx: usize) -> Contour {
    let is_fg = |p: Point| {
        p.x >= 0
            && p.y >= 0
            && (p.x as usize) < width
            && (p.y as usize) < height
            && mask[p.y as usize * width + p.x as usize] != 0
    };
    let start = Point::new((start_idx % width) as i32, (start_idx / width) as i32);
    let mut points = vec![start];

    // Entered from the west background pixel.
    let mut current = start;
    let mut backtrack_dir = 0usize;
    let mut second: Option<Point> = None;
    let max_steps = 4 * mask.len() + 8;

    for _ in 0..max_steps {
        let mut next = None;
        for step in 1..=8 {
            let dir = (backtrack_dir + step) % 8;
            let (dx, dy) = NEIGHBOURS[dir];
            let candidate = Point::new(current.x + dx, current.y + dy);
            if is_fg(candidate) {
                // The pixel examined just before the hit is background and
                // becomes the new backtrack, seen from the candidate.
                let prev_dir = (dir + 7) % 8;
                let (bx, by) = NEIGHBOURS[prev_dir];
                let back = Point::new(current.x + bx, current.y + by);
                next = Some((candidate, direction_of(candidate, back)));
                break;
            }
        }
        let Some((candidate, new_backtrack)) = next else {
            // Isolated pixel.
            break;
        };
        if current == start {
            match second {
                None => second = Some(candidate),
                Some(first_step) if first_step == candidate => break,
                Some(_) => {}
            }
        }
        points.push(candidate);
        current = candidate;
        backtrack_dir = new_backtrack;
    }

    if points.len() > 1 && points.last() == Some(&start) {
        points.pop();
    }
    Contour { points }
}

fn direction_of(from: Point, to: Point) -> usize {
    let delta = (to.x - from.x, to.y - from.y);
    NEIGHBOURS
        .iter()
        .position(|&d| d == delta)
        .unwrap_or(0)
}
