use std::io::Write;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use galaxy_core::Point;
use tracing::{debug, warn};

use crate::interact::Renderer;

/// Cell marks for successive images; later images reuse the last one.
const LAYERS: &[char] = &['#', '+', '*', 'o', '.'];

/// Largest grid `to_ascii` will lay out.
const MAX_CELLS: u128 = 1 << 18;

/// The images of the current frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Canvas {
    images: Vec<Vec<Point>>,
    frame: u64,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.images.clear();
        self.frame += 1;
    }

    pub fn push(&mut self, points: &[Point]) {
        self.images.push(points.to_vec());
    }

    pub fn images(&self) -> &[Vec<Point>] {
        &self.images
    }

    /// Frames started so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// `(min_x, min_y, max_x, max_y)` over every point, if any.
    pub fn bounds(&self) -> Option<(i64, i64, i64, i64)> {
        let mut points = self.images.iter().flatten();
        let &(x, y) = points.next()?;
        Some(points.fold((x, y, x, y), |(x0, y0, x1, y1), &(x, y)| {
            (x0.min(x), y0.min(y), x1.max(x), y1.max(y))
        }))
    }

    /// Rows top to bottom; earlier images win overlapping cells. Frames too
    /// large to draw are summarized instead.
    pub fn to_ascii(&self) -> String {
        let Some((x0, y0, x1, y1)) = self.bounds() else {
            return String::new();
        };
        let width = (i128::from(x1) - i128::from(x0) + 1) as u128;
        let height = (i128::from(y1) - i128::from(y0) + 1) as u128;
        if width.checked_mul(height).map_or(true, |cells| cells > MAX_CELLS) {
            return self.summary((x0, y0, x1, y1));
        }
        let (width, height) = (width as usize, height as usize);
        let mut grid = vec![vec![' '; width]; height];
        for (layer, image) in self.images.iter().enumerate() {
            let mark = LAYERS[layer.min(LAYERS.len() - 1)];
            for &(x, y) in image {
                let row = (i128::from(y) - i128::from(y0)) as usize;
                let col = (i128::from(x) - i128::from(x0)) as usize;
                let cell = &mut grid[row][col];
                if *cell == ' ' {
                    *cell = mark;
                }
            }
        }
        let mut out = String::with_capacity((width + 1) * height);
        for row in grid {
            out.push_str(row.iter().collect::<String>().trim_end());
            out.push('\n');
        }
        out
    }

    fn summary(&self, (x0, y0, x1, y1): (i64, i64, i64, i64)) -> String {
        let mut out = format!("too large to draw: ({x0}, {y0})..({x1}, {y1})\n");
        for (layer, image) in self.images.iter().enumerate() {
            let mark = LAYERS[layer.min(LAYERS.len() - 1)];
            out.push_str(&format!("{mark} {} point(s)\n", image.len()));
        }
        out
    }
}

/// Draws into a shared canvas and wakes the presenter when a frame is done.
pub struct CanvasRenderer {
    canvas: Arc<Mutex<Canvas>>,
    notify: Sender<u64>,
}

impl CanvasRenderer {
    pub fn new(canvas: Arc<Mutex<Canvas>>, notify: Sender<u64>) -> Self {
        CanvasRenderer { canvas, notify }
    }
}

impl Renderer for CanvasRenderer {
    fn clear(&mut self) {
        self.canvas.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn draw(&mut self, points: &[Point]) {
        self.canvas
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(points);
    }

    fn present(&mut self) {
        let frame = self.canvas.lock().unwrap_or_else(|e| e.into_inner()).frame();
        if self.notify.send(frame).is_err() {
            warn!(frame, "presenter has stopped");
        }
    }
}

/// Background thread printing each presented frame as ASCII.
pub struct Presenter {
    handle: JoinHandle<usize>,
}

impl Presenter {
    /// Start presenting `canvas` to `out`. Returns the presenter and the
    /// renderer feeding it; dropping the renderer lets the thread finish.
    pub fn spawn<W: Write + Send + 'static>(
        canvas: Arc<Mutex<Canvas>>,
        out: W,
    ) -> (Presenter, CanvasRenderer) {
        let (tx, rx) = mpsc::channel();
        let shared = Arc::clone(&canvas);
        let handle = thread::spawn(move || present_loop(&shared, &rx, out));
        (Presenter { handle }, CanvasRenderer::new(canvas, tx))
    }

    /// Wait for the thread; returns how many frames it printed.
    pub fn join(self) -> usize {
        self.handle.join().unwrap_or_else(|_| {
            warn!("presenter thread panicked");
            0
        })
    }
}

fn present_loop<W: Write>(canvas: &Mutex<Canvas>, rx: &Receiver<u64>, mut out: W) -> usize {
    let mut printed = 0;
    while let Ok(mut frame) = rx.recv() {
        // only the newest pending frame is worth printing
        while let Ok(newer) = rx.try_recv() {
            frame = newer;
        }
        let text = canvas.lock().unwrap_or_else(|e| e.into_inner()).to_ascii();
        if writeln!(out, "-- frame {frame} --\n{text}")
            .and_then(|()| out.flush())
            .is_err()
        {
            warn!("presenter output closed");
            break;
        }
        debug!(frame, "presented");
        printed += 1;
    }
    printed
}
