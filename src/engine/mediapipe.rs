//! Engine backed by `libmediapipe`, a C wrapper around the MediaPipe framework.
//!
//! Every handle handed out by the library is owned by a wrapper type that releases it on drop.

use std::{
    collections::HashMap,
    ffi::{CStr, CString},
    os::unix::ffi::OsStrExt,
    path::Path,
    ptr::NonNull,
    slice,
};

use anyhow::{anyhow, bail, Context};

use crate::{
    hand::{NormalizedPoint, OrientedBox, Skeleton},
    image::Image,
};

use super::{Engine, GraphConfig, OptionValue, SidePacket};

#[allow(non_camel_case_types)]
mod sys {
    use std::os::raw::{c_char, c_double, c_float, c_int};

    #[repr(C)]
    pub struct mp_instance_builder {
        _priv: [u8; 0],
    }

    #[repr(C)]
    pub struct mp_instance {
        _priv: [u8; 0],
    }

    #[repr(C)]
    pub struct mp_poller {
        _priv: [u8; 0],
    }

    #[repr(C)]
    pub struct mp_packet {
        _priv: [u8; 0],
    }

    pub const MP_IMAGE_FORMAT_SRGB: c_int = 1;

    #[repr(C)]
    pub struct mp_image {
        pub data: *const u8,
        pub width: c_int,
        pub height: c_int,
        pub format: c_int,
    }

    #[repr(C)]
    pub struct mp_landmark {
        pub x: c_float,
        pub y: c_float,
        pub z: c_float,
    }

    #[repr(C)]
    pub struct mp_landmark_list {
        pub elements: *mut mp_landmark,
        pub length: c_int,
    }

    #[repr(C)]
    pub struct mp_multi_face_landmark_list {
        pub elements: *mut mp_landmark_list,
        pub length: c_int,
    }

    #[repr(C)]
    pub struct mp_rect {
        pub x_center: c_float,
        pub y_center: c_float,
        pub width: c_float,
        pub height: c_float,
        pub rotation: c_float,
        pub id: i64,
    }

    #[repr(C)]
    pub struct mp_rect_list {
        pub elements: *mut mp_rect,
        pub length: c_int,
    }

    #[link(name = "mediapipe")]
    extern "C" {
        pub fn mp_set_resource_dir(dir: *const c_char);

        pub fn mp_create_instance_builder(
            graph_filename: *const c_char,
            input_stream: *const c_char,
        ) -> *mut mp_instance_builder;
        pub fn mp_add_option_float(
            builder: *mut mp_instance_builder,
            node: *const c_char,
            option: *const c_char,
            value: c_float,
        );
        pub fn mp_add_option_double(
            builder: *mut mp_instance_builder,
            node: *const c_char,
            option: *const c_char,
            value: c_double,
        );
        pub fn mp_add_side_packet(
            builder: *mut mp_instance_builder,
            name: *const c_char,
            packet: *mut mp_packet,
        );
        pub fn mp_create_instance(builder: *mut mp_instance_builder) -> *mut mp_instance;

        pub fn mp_create_poller(
            instance: *mut mp_instance,
            output_stream: *const c_char,
        ) -> *mut mp_poller;
        pub fn mp_start(instance: *mut mp_instance) -> bool;
        pub fn mp_process(instance: *mut mp_instance, packet: *mut mp_packet) -> bool;
        pub fn mp_wait_until_idle(instance: *mut mp_instance) -> bool;
        pub fn mp_get_queue_size(poller: *mut mp_poller) -> c_int;
        pub fn mp_destroy_poller(poller: *mut mp_poller);
        pub fn mp_destroy_instance(instance: *mut mp_instance) -> bool;

        pub fn mp_create_packet_int(value: c_int) -> *mut mp_packet;
        pub fn mp_create_packet_float(value: c_float) -> *mut mp_packet;
        pub fn mp_create_packet_bool(value: bool) -> *mut mp_packet;
        pub fn mp_create_packet_image(image: mp_image) -> *mut mp_packet;
        pub fn mp_poll_packet(poller: *mut mp_poller) -> *mut mp_packet;
        pub fn mp_destroy_packet(packet: *mut mp_packet);

        pub fn mp_get_norm_multi_face_landmarks(
            packet: *mut mp_packet,
        ) -> *mut mp_multi_face_landmark_list;
        pub fn mp_destroy_multi_face_landmarks(list: *mut mp_multi_face_landmark_list);
        pub fn mp_get_norm_rects(packet: *mut mp_packet) -> *mut mp_rect_list;
        pub fn mp_destroy_rects(list: *mut mp_rect_list);

        pub fn mp_get_last_error() -> *const c_char;
        pub fn mp_free_error(message: *const c_char);
    }
}

/// Takes the library's last error message.
fn last_error() -> anyhow::Error {
    unsafe {
        let msg = sys::mp_get_last_error();
        if msg.is_null() {
            return anyhow!("[MediaPipe] unknown error");
        }
        let err = anyhow!("[MediaPipe] {}", CStr::from_ptr(msg).to_string_lossy());
        sys::mp_free_error(msg);
        err
    }
}

fn c_string(s: &str) -> anyhow::Result<CString> {
    CString::new(s).with_context(|| format!("'{s}' contains a NUL byte"))
}

fn c_path(path: &Path) -> anyhow::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .with_context(|| format!("'{}' contains a NUL byte", path.display()))
}

/// Views a C array as a slice; null or non-positive lengths yield an empty slice.
///
/// # Safety
///
/// If `ptr` is non-null, it must point to `len` initialized elements that outlive `'a`.
unsafe fn c_slice<'a, T>(ptr: *const T, len: i32) -> &'a [T] {
    if ptr.is_null() || len <= 0 {
        &[]
    } else {
        slice::from_raw_parts(ptr, len as usize)
    }
}

/// Instance builder.
///
/// The library has no way to destroy a builder other than turning it into an instance with
/// [`Builder::build`], so everything that can fail is prepared before [`Builder::new`] is called
/// and no method in between returns early.
struct Builder(NonNull<sys::mp_instance_builder>);

impl Builder {
    fn new(graph: &CStr, input_stream: &CStr) -> anyhow::Result<Self> {
        let raw = unsafe { sys::mp_create_instance_builder(graph.as_ptr(), input_stream.as_ptr()) };
        NonNull::new(raw).map(Self).ok_or_else(last_error)
    }

    fn option(&mut self, node: &CStr, option: &CStr, value: OptionValue) {
        unsafe {
            match value {
                OptionValue::Float(v) => {
                    sys::mp_add_option_float(self.0.as_ptr(), node.as_ptr(), option.as_ptr(), v)
                }
                OptionValue::Double(v) => {
                    sys::mp_add_option_double(self.0.as_ptr(), node.as_ptr(), option.as_ptr(), v)
                }
            }
        }
    }

    fn side_packet(&mut self, name: &CStr, packet: Packet) {
        unsafe { sys::mp_add_side_packet(self.0.as_ptr(), name.as_ptr(), packet.into_raw()) }
    }

    fn build(self) -> anyhow::Result<Instance> {
        let raw = unsafe { sys::mp_create_instance(self.0.as_ptr()) };
        NonNull::new(raw).map(Instance).ok_or_else(last_error)
    }
}

struct Instance(NonNull<sys::mp_instance>);

impl Drop for Instance {
    fn drop(&mut self) {
        if !unsafe { sys::mp_destroy_instance(self.0.as_ptr()) } {
            log::error!("failed to destroy graph instance: {}", last_error());
        }
    }
}

struct Poller(NonNull<sys::mp_poller>);

impl Drop for Poller {
    fn drop(&mut self) {
        unsafe { sys::mp_destroy_poller(self.0.as_ptr()) }
    }
}

struct Packet(NonNull<sys::mp_packet>);

impl Packet {
    fn new(raw: *mut sys::mp_packet) -> anyhow::Result<Self> {
        NonNull::new(raw).map(Self).ok_or_else(last_error)
    }

    fn side_packet(value: SidePacket) -> anyhow::Result<Self> {
        Self::new(unsafe {
            match value {
                SidePacket::Int(v) => sys::mp_create_packet_int(v),
                SidePacket::Bool(v) => sys::mp_create_packet_bool(v),
                SidePacket::Float(v) => sys::mp_create_packet_float(v),
            }
        })
    }

    /// Hands ownership of the packet to the library.
    fn into_raw(self) -> *mut sys::mp_packet {
        let raw = self.0.as_ptr();
        std::mem::forget(self);
        raw
    }
}

impl Drop for Packet {
    fn drop(&mut self) {
        unsafe { sys::mp_destroy_packet(self.0.as_ptr()) }
    }
}

struct LandmarkLists(NonNull<sys::mp_multi_face_landmark_list>);

impl Drop for LandmarkLists {
    fn drop(&mut self) {
        unsafe { sys::mp_destroy_multi_face_landmarks(self.0.as_ptr()) }
    }
}

struct RectList(NonNull<sys::mp_rect_list>);

impl Drop for RectList {
    fn drop(&mut self) {
        unsafe { sys::mp_destroy_rects(self.0.as_ptr()) }
    }
}

/// A running MediaPipe graph.
pub struct MediaPipe {
    // Pollers are owned by the instance and must be destroyed first (fields drop in order).
    pollers: HashMap<String, Poller>,
    instance: Instance,
    /// Packed RGB copy of the last submitted frame; the graph reads it until it is idle.
    frame: Vec<u8>,
}

impl MediaPipe {
    /// Instantiates and starts the graph described by `config`, creating a poller for each of the
    /// `outputs` streams.
    pub fn start(config: &GraphConfig, outputs: &[&str]) -> anyhow::Result<Self> {
        config.check()?;

        let resource_dir = c_path(config.resource_dir())?;
        unsafe { sys::mp_set_resource_dir(resource_dir.as_ptr()) }

        let graph = config.graph_path();
        log::debug!(
            "loading graph {} (input stream `{}`)",
            graph.display(),
            config.input_stream()
        );
        let c_graph = c_path(&graph)?;
        let c_input_stream = c_string(config.input_stream())?;
        let options = config
            .options()
            .iter()
            .map(|opt| {
                log::debug!("option {}.{} = {}", opt.node, opt.option, opt.value);
                Ok((c_string(&opt.node)?, c_string(&opt.option)?, opt.value))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let side_packets = config
            .side_packets()
            .iter()
            .map(|(name, value)| {
                log::debug!("side packet {name} = {value}");
                Ok((c_string(name)?, Packet::side_packet(*value)?))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut builder = Builder::new(&c_graph, &c_input_stream)
            .context("failed to create graph instance builder")?;
        for (node, option, value) in &options {
            builder.option(node, option, *value);
        }
        for (name, packet) in side_packets {
            builder.side_packet(&name, packet);
        }

        let instance = builder.build().context("failed to create graph instance")?;

        let mut pollers = HashMap::new();
        for &stream in outputs {
            let c_stream = c_string(stream)?;
            let raw = unsafe { sys::mp_create_poller(instance.0.as_ptr(), c_stream.as_ptr()) };
            let poller = NonNull::new(raw)
                .map(Poller)
                .ok_or_else(last_error)
                .with_context(|| format!("failed to create poller for `{stream}`"))?;
            pollers.insert(stream.to_string(), poller);
        }

        let this = Self {
            pollers,
            instance,
            frame: Vec::new(),
        };
        if !unsafe { sys::mp_start(this.instance.0.as_ptr()) } {
            return Err(last_error()).context("failed to start graph");
        }
        log::debug!("graph started");

        Ok(this)
    }

    fn poller(&self, stream: &str) -> anyhow::Result<&Poller> {
        match self.pollers.get(stream) {
            Some(poller) => Ok(poller),
            None => bail!("no poller for output stream `{stream}`"),
        }
    }

    fn poll(&self, stream: &str) -> anyhow::Result<Option<Packet>> {
        let poller = self.poller(stream)?;
        let raw = unsafe { sys::mp_poll_packet(poller.0.as_ptr()) };
        Ok(NonNull::new(raw).map(Packet))
    }
}

impl Engine for MediaPipe {
    fn process(&mut self, image: &Image) -> anyhow::Result<()> {
        self.frame = image.to_rgb8();
        let raw = sys::mp_image {
            data: self.frame.as_ptr(),
            width: image.width().try_into()?,
            height: image.height().try_into()?,
            format: sys::MP_IMAGE_FORMAT_SRGB,
        };
        let packet = Packet::new(unsafe { sys::mp_create_packet_image(raw) })?;
        if !unsafe { sys::mp_process(self.instance.0.as_ptr(), packet.into_raw()) } {
            return Err(last_error());
        }
        Ok(())
    }

    fn wait_until_idle(&mut self) -> anyhow::Result<()> {
        if !unsafe { sys::mp_wait_until_idle(self.instance.0.as_ptr()) } {
            return Err(last_error());
        }
        Ok(())
    }

    fn queue_size(&mut self, stream: &str) -> anyhow::Result<usize> {
        let poller = self.poller(stream)?;
        let size = unsafe { sys::mp_get_queue_size(poller.0.as_ptr()) };
        Ok(size.max(0) as usize)
    }

    fn poll_landmarks(&mut self, stream: &str) -> anyhow::Result<Option<Vec<Skeleton>>> {
        let Some(packet) = self.poll(stream)? else {
            return Ok(None);
        };
        let raw = unsafe { sys::mp_get_norm_multi_face_landmarks(packet.0.as_ptr()) };
        let owned = NonNull::new(raw).map(LandmarkLists).ok_or_else(last_error)?;

        let lists = unsafe {
            let lists = owned.0.as_ref();
            c_slice(lists.elements, lists.length)
        };
        let mut skeletons = Vec::with_capacity(lists.len());
        for list in lists {
            let landmarks = unsafe { c_slice(list.elements, list.length) };
            let points = landmarks.iter().map(|lm| NormalizedPoint {
                x: lm.x,
                y: lm.y,
                z: lm.z,
            });
            match Skeleton::from_landmarks(points) {
                Some(skeleton) => skeletons.push(skeleton),
                None => log::warn!(
                    "skipping hand with {} landmarks (expected {})",
                    landmarks.len(),
                    Skeleton::NUM_LANDMARKS
                ),
            }
        }

        Ok(Some(skeletons))
    }

    fn poll_rects(&mut self, stream: &str) -> anyhow::Result<Option<Vec<OrientedBox>>> {
        let Some(packet) = self.poll(stream)? else {
            return Ok(None);
        };
        let raw = unsafe { sys::mp_get_norm_rects(packet.0.as_ptr()) };
        let owned = NonNull::new(raw).map(RectList).ok_or_else(last_error)?;

        let rects = unsafe {
            let list = owned.0.as_ref();
            c_slice(list.elements, list.length)
        };
        let boxes = rects
            .iter()
            .map(|r| OrientedBox::new(r.x_center, r.y_center, r.width, r.height, r.rotation))
            .collect();

        Ok(Some(boxes))
    }
}
