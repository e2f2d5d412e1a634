//! A simple, high-level debug GUI.
//!
//! [`run`] takes over the main thread to drive the window system's event loop and runs the
//! application on a second thread. The application shows images with [`show_image`] and receives
//! key presses through [`wait_key`].

mod renderer;

use std::{
    collections::{hash_map::Entry, HashMap},
    panic::{catch_unwind, AssertUnwindSafe},
    process,
    rc::Rc,
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Mutex,
    },
    time::Duration,
};

use anyhow::anyhow;
use once_cell::sync::OnceCell;
use winit::{
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy, EventLoopWindowTarget},
    window::WindowId,
};

use crate::{
    image::{Image, Resolution},
    termination::{self, Termination},
};

use self::renderer::{Gpu, Renderer, Window};

/// A key press (or a request to close a window) received by any window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    /// Any other key.
    Other,
    /// The user asked to close a window.
    Closed,
}

impl Key {
    fn from_keycode(code: VirtualKeyCode) -> Self {
        match code {
            VirtualKeyCode::Escape => Key::Escape,
            _ => Key::Other,
        }
    }

    /// Returns whether this key press asks the application to stop.
    pub fn is_quit(self) -> bool {
        matches!(self, Key::Escape | Key::Closed)
    }
}

#[derive(Debug)]
enum Msg {
    Image {
        title: String,
        res: Resolution,
        data: Vec<u8>,
    },
}

struct Gui {
    gpu: Rc<Gpu>,
    windows: HashMap<String, Renderer>,
    win_id_to_title: HashMap<WindowId, String>,
    keys: Sender<Key>,
}

impl Gui {
    fn renderer_mut(&mut self, win: WindowId) -> Option<&mut Renderer> {
        let title = self.win_id_to_title.get(&win)?;
        self.windows.get_mut(title)
    }

    fn show(
        &mut self,
        target: &EventLoopWindowTarget<Msg>,
        title: String,
        res: Resolution,
        data: &[u8],
    ) -> anyhow::Result<()> {
        let renderer = match self.windows.entry(title) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                log::debug!("creating window '{}' at {res}", e.key());

                let win = Window::open(target, e.key(), res)?;
                let win_id = win.win.id();
                let renderer = Renderer::new(win, self.gpu.clone())?;
                self.win_id_to_title.insert(win_id, e.key().clone());
                e.insert(renderer)
            }
        };

        renderer.update_texture(res, data);
        renderer.window().request_redraw();
        Ok(())
    }

    fn key(&self, key: Key) {
        // The application may have stopped listening; key presses are dropped then.
        self.keys.send(key).ok();
    }

    fn run(mut self, event_loop: EventLoop<Msg>) -> ! {
        event_loop.run(move |event, target, flow| {
            *flow = ControlFlow::Wait;
            match event {
                Event::UserEvent(Msg::Image { title, res, data }) => {
                    if let Err(e) = self.show(target, title, res, &data) {
                        eprintln!("Error: {e:?}");
                        process::exit(1);
                    }
                }
                Event::RedrawRequested(window) => {
                    if let Some(renderer) = self.renderer_mut(window) {
                        if let Err(e) = renderer.redraw() {
                            log::error!("failed to redraw window: {e}");
                        }
                    }
                }
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => self.key(Key::Closed),
                    WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                state: ElementState::Pressed,
                                virtual_keycode: Some(code),
                                ..
                            },
                        ..
                    } => self.key(Key::from_keycode(code)),
                    _ => {}
                },
                _ => {}
            }
        });
    }
}

/// Connection between the application thread and the event loop.
struct Connection {
    proxy: Mutex<EventLoopProxy<Msg>>,
    keys: Mutex<Receiver<Key>>,
}

static CONNECTION: OnceCell<Connection> = OnceCell::new();

fn connection() -> anyhow::Result<&'static Connection> {
    CONNECTION
        .get()
        .ok_or_else(|| anyhow!("the GUI is not running (use `gui::run`)"))
}

fn send(msg: Msg) -> anyhow::Result<()> {
    let proxy = connection()?
        .proxy
        .lock()
        .map_err(|_| anyhow!("GUI connection poisoned"))?;
    proxy
        .send_event(msg)
        .map_err(|_closed| anyhow!("GUI event loop has exited"))
}

/// Runs `app` on a background thread while the main thread runs the GUI event loop.
///
/// The process exits once `app` returns: with code 0 if it succeeded, with code 1 (after printing
/// the error) if it failed, and with code 101 if it panicked.
pub fn run<F, R>(app: F) -> !
where
    F: FnOnce() -> R + Send + 'static,
    R: Termination + Send,
{
    let event_loop = EventLoopBuilder::with_user_event().build();
    let (keys_tx, keys_rx) = mpsc::channel();
    let conn = Connection {
        proxy: Mutex::new(event_loop.create_proxy()),
        keys: Mutex::new(keys_rx),
    };
    assert!(CONNECTION.set(conn).is_ok(), "`gui::run` called twice");

    let gpu = match pollster::block_on(Gpu::open()) {
        Ok(gpu) => gpu,
        Err(e) => {
            eprintln!("Error: failed to open GPU: {e:?}");
            process::exit(1);
        }
    };

    std::thread::spawn(move || match catch_unwind(AssertUnwindSafe(app)) {
        Ok(term) => {
            let code = termination::exit_code(&term);
            if code != 0 {
                // Prints the error message.
                term.report();
            }
            process::exit(code);
        }
        Err(_payload) => {
            // The panic hook has printed the message already; exit like libstd would.
            process::exit(101);
        }
    });

    let gui = Gui {
        gpu: Rc::new(gpu),
        windows: HashMap::new(),
        win_id_to_title: HashMap::new(),
        keys: keys_tx,
    };
    gui.run(event_loop);
}

/// Displays an image in the window titled `title`, creating the window if needed.
pub fn show_image(title: impl Into<String>, image: &Image) -> anyhow::Result<()> {
    // Image data is RGBA8 internally so that no conversion before GPU upload is needed.
    send(Msg::Image {
        title: title.into(),
        res: image.resolution(),
        data: image.data().to_vec(),
    })
}

/// Waits up to `timeout` for a key press in any window.
///
/// Returns `None` if no key was pressed in time.
pub fn wait_key(timeout: Duration) -> anyhow::Result<Option<Key>> {
    let keys = connection()?
        .keys
        .lock()
        .map_err(|_| anyhow!("GUI connection poisoned"))?;
    match keys.recv_timeout(timeout) {
        Ok(key) => Ok(Some(key)),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(RecvTimeoutError::Disconnected) => Ok(Some(Key::Closed)),
    }
}
