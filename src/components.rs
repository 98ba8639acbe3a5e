//! Connected component labeling over a grid of keys.

use std::collections::VecDeque;

/// Which neighbors of a pixel count as connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connectivity {
    /// Only the horizontal and vertical neighbors.
    Four,
    /// The horizontal, vertical, and diagonal neighbors.
    Eight,
}

impl Connectivity {
    /// The `(dx, dy)` offsets of the neighbors.
    #[must_use]
    pub const fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            Connectivity::Four => &[(1, 0), (0, 1), (-1, 0), (0, -1)],
            Connectivity::Eight => &[
                (1, 0),
                (1, 1),
                (0, 1),
                (-1, 1),
                (-1, 0),
                (-1, -1),
                (0, -1),
                (1, -1),
            ],
        }
    }
}

/// A maximal connected set of pixels sharing the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// The key shared by every pixel of the component.
    pub key: u32,
    /// The number of pixels.
    pub area: usize,
    /// The first pixel of the component in row-major order.
    pub start: (u32, u32),
    /// The inclusive bounding box, `(min_x, min_y, max_x, max_y)`.
    pub bbox: (u32, u32, u32, u32),
}

/// The result of labeling a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labeling {
    /// The number of columns.
    width: u32,
    /// The number of rows.
    height: u32,
    /// The component index of each pixel.
    labels: Vec<u32>,
    /// The components in order of their first pixel.
    components: Vec<Component>,
}

impl Labeling {
    /// Labels the connected components of equal keys in a row-major grid.
    ///
    /// Components are numbered in the order their first pixel appears in a raster scan.
    ///
    /// # Panics
    /// Panics if `keys.len()` is not `width * height`.
    #[must_use]
    pub fn new(width: u32, height: u32, keys: &[u32], connectivity: Connectivity) -> Self {
        assert_eq!(keys.len(), width as usize * height as usize);

        let mut labels = vec![u32::MAX; keys.len()];
        let mut components = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..keys.len() {
            if labels[start] != u32::MAX {
                continue;
            }

            #[allow(clippy::cast_possible_truncation)]
            let id = components.len() as u32;
            let key = keys[start];

            #[allow(clippy::cast_possible_truncation)]
            let (sx, sy) = ((start % width as usize) as u32, (start / width as usize) as u32);
            let mut component = Component { key, area: 0, start: (sx, sy), bbox: (sx, sy, sx, sy) };

            labels[start] = id;
            queue.push_back((sx, sy));

            while let Some((x, y)) = queue.pop_front() {
                component.area += 1;
                let bbox = &mut component.bbox;
                bbox.0 = bbox.0.min(x);
                bbox.1 = bbox.1.min(y);
                bbox.2 = bbox.2.max(x);
                bbox.3 = bbox.3.max(y);

                for &(dx, dy) in connectivity.offsets() {
                    let Some(nx) = x.checked_add_signed(dx).filter(|&nx| nx < width) else {
                        continue;
                    };
                    let Some(ny) = y.checked_add_signed(dy).filter(|&ny| ny < height) else {
                        continue;
                    };

                    let n = ny as usize * width as usize + nx as usize;
                    if labels[n] == u32::MAX && keys[n] == key {
                        labels[n] = id;
                        queue.push_back((nx, ny));
                    }
                }
            }

            components.push(component);
        }

        Self { width, height, labels, components }
    }

    /// The number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The component index of each pixel, in row-major order.
    #[must_use]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// The components in order of their first pixel.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }
}
