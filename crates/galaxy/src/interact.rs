use galaxy_core::{GalaxyError, Op, Point, TermId, Value};
use galaxy_eval::Evaluator;
use galaxy_modem::{demodulate, modulate, term_to_value, value_to_term};
use num_traits::ToPrimitive;
use tracing::{debug, info};

/// Carries modulated payloads to the peer and returns its modulated reply.
pub trait Transport {
    fn send(&mut self, bits: &str) -> Result<String, GalaxyError>;
}

/// Receives the images a protocol asks to draw.
pub trait Renderer {
    /// Start a new frame; called once before the images of a step.
    fn clear(&mut self) {}

    fn draw(&mut self, points: &[Point]);

    /// The frame is complete.
    fn present(&mut self) {}
}

/// One round trip through the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub sent: Value,
    pub received: Value,
}

/// What one click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub flag: i64,
    pub state: Value,
    pub images: Vec<Vec<Point>>,
    pub exchanges: Vec<Exchange>,
}

/// Drives a protocol: `protocol state input` yields `[flag, state, payload]`;
/// flag 0 draws the payload, anything else sends it and feeds the reply
/// back in.
pub struct Interaction<T, R> {
    evaluator: Evaluator,
    protocol: TermId,
    state: TermId,
    last_flag: Option<i64>,
    transport: T,
    renderer: R,
}

impl<T: Transport, R: Renderer> Interaction<T, R> {
    /// `protocol` is read as a term, usually the name of a loaded definition.
    pub fn new(
        mut evaluator: Evaluator,
        protocol: &str,
        transport: T,
        renderer: R,
    ) -> Result<Self, GalaxyError> {
        let protocol = evaluator.read(protocol)?;
        let state = evaluator.arena_mut().op(Op::Nil);
        Ok(Interaction {
            evaluator,
            protocol,
            state,
            last_flag: None,
            transport,
            renderer,
        })
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn last_flag(&self) -> Option<i64> {
        self.last_flag
    }

    pub fn state(&self) -> Result<Value, GalaxyError> {
        term_to_value(self.evaluator.arena(), self.state)
    }

    pub fn into_parts(self) -> (Evaluator, T, R) {
        (self.evaluator, self.transport, self.renderer)
    }

    /// Click at `(x, y)`.
    pub fn click(&mut self, x: i64, y: i64) -> Result<StepReport, GalaxyError> {
        let arena = self.evaluator.arena_mut();
        let (x, y) = (arena.int(x), arena.int(y));
        let point = arena.vector(x, y);
        self.step(point)
    }

    /// Run the protocol on `input` until it asks to draw.
    pub fn step(&mut self, input: TermId) -> Result<StepReport, GalaxyError> {
        let mut input = input;
        let mut exchanges = Vec::new();
        loop {
            let store = self.evaluator.store_mut();
            let applied = store.app(self.protocol, self.state);
            let call = store.app(applied, input);
            let result = self.evaluator.force_value(call)?;
            let (flag, state, payload) = destructure(result)?;

            self.state = value_to_term(self.evaluator.arena_mut(), &state);
            self.last_flag = Some(flag);
            debug!(flag, state = %state, "protocol returned");

            if flag == 0 {
                let images = images(&payload)?;
                self.renderer.clear();
                for image in &images {
                    self.renderer.draw(image);
                }
                self.renderer.present();
                info!(
                    images = images.len(),
                    exchanges = exchanges.len(),
                    "step finished"
                );
                return Ok(StepReport {
                    flag,
                    state,
                    images,
                    exchanges,
                });
            }

            let reply_bits = self.transport.send(&modulate(&payload))?;
            let reply = demodulate(&reply_bits)?;
            info!(sent = %payload, received = %reply, "exchange");
            input = value_to_term(self.evaluator.arena_mut(), &reply);
            exchanges.push(Exchange {
                sent: payload,
                received: reply,
            });
        }
    }
}

fn destructure(result: Value) -> Result<(i64, Value, Value), GalaxyError> {
    let shape_error = |v: &Value| {
        GalaxyError::decode(format!("expected [flag, state, payload], got {v}"))
    };
    let items = match result.as_list() {
        Some(items) if items.len() == 3 => {
            [items[0].clone(), items[1].clone(), items[2].clone()]
        }
        _ => return Err(shape_error(&result)),
    };
    let [flag, state, payload] = items;
    let flag = flag
        .as_int()
        .and_then(|n| n.to_i64())
        .ok_or_else(|| GalaxyError::decode(format!("flag must be an integer, got {flag}")))?;
    Ok((flag, state, payload))
}

fn images(payload: &Value) -> Result<Vec<Vec<Point>>, GalaxyError> {
    let invalid = || GalaxyError::decode(format!("expected a list of point lists, got {payload}"));
    payload
        .as_list()
        .ok_or_else(invalid)?
        .into_iter()
        .map(|image| image.as_points().ok_or_else(invalid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        frames: usize,
        images: Vec<Vec<Point>>,
    }

    impl Renderer for Recorder {
        fn clear(&mut self) {
            self.images.clear();
        }

        fn draw(&mut self, points: &[Point]) {
            self.images.push(points.to_vec());
        }

        fn present(&mut self) {
            self.frames += 1;
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn send(&mut self, bits: &str) -> Result<String, GalaxyError> {
            Err(GalaxyError::transport(format!("no peer for {bits}")))
        }
    }

    fn interaction(program: &str, protocol: &str) -> Interaction<Unreachable, Recorder> {
        let mut evaluator = Evaluator::new();
        evaluator.load_program(program).unwrap();
        Interaction::new(evaluator, protocol, Unreachable, Recorder::default()).unwrap()
    }

    #[test]
    fn draw_step_reaches_the_renderer() {
        // ignores state and input, returns [0, 5, [[(1, 2)]]]
        let mut i = interaction(
            "still = ap t ap t ap ap cons 0 ap ap cons 5 ap ap cons ap ap cons ap ap cons ap ap vec 1 2 nil nil nil",
            "still",
        );
        let report = i.click(3, 4).unwrap();
        assert_eq!(report.flag, 0);
        assert_eq!(report.state, Value::int(5));
        assert_eq!(report.images, vec![vec![(1, 2)]]);
        assert!(report.exchanges.is_empty());
        assert_eq!(i.last_flag(), Some(0));
        assert_eq!(i.state().unwrap(), Value::int(5));
        assert_eq!(i.renderer().images, vec![vec![(1, 2)]]);
        assert_eq!(i.renderer().frames, 1);
    }

    #[test]
    fn wrong_shape_is_a_decode_error() {
        let mut i = interaction("bad = ap t 5", "bad");
        let err = i.click(0, 0).unwrap_err();
        assert!(matches!(err, GalaxyError::Decode(_)), "{err}");
        assert_eq!(i.last_flag(), None);
    }

    #[test]
    fn send_failures_propagate() {
        // always [1, nil, 7]
        let mut i = interaction(
            "chatty = ap t ap t ap ap cons 1 ap ap cons nil ap ap cons 7 nil",
            "chatty",
        );
        let err = i.click(0, 0).unwrap_err();
        assert!(matches!(err, GalaxyError::Transport(_)), "{err}");
        assert_eq!(i.last_flag(), Some(1));
        assert_eq!(i.renderer().frames, 0);
    }

    #[test]
    fn destructure_checks_the_flag() {
        let v = Value::list([Value::Nil, Value::Nil, Value::Nil]);
        assert!(destructure(v).is_err());
        let v = Value::list([Value::int(0), Value::Nil]);
        assert!(destructure(v).is_err());
        let v = Value::list([Value::int(1), Value::int(2), Value::Nil]);
        assert_eq!(destructure(v).unwrap(), (1, Value::int(2), Value::Nil));
    }

    #[test]
    fn images_are_point_lists() {
        let payload = Value::list([
            Value::list([Value::from((1, 2)), Value::from((3, 4))]),
            Value::Nil,
        ]);
        assert_eq!(images(&payload).unwrap(), vec![vec![(1, 2), (3, 4)], vec![]]);
        assert!(images(&Value::int(3)).is_err());
        assert!(images(&Value::list([Value::int(3)])).is_err());
    }
}
