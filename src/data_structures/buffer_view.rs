//! Buffer views and their GPU residency.
//!
//! A [`BufferView`] borrows a sub-range of the binary chunk. Primitives claim
//! views by adding usage flags; once every primitive has done so, each view
//! with at least one claim is uploaded to its own GPU buffer exactly once.
//! Views nobody claimed stay on the CPU.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::{
    error::{LoadError, Result},
    glb::{RawBuffer, schema::BufferViewDescriptor},
};

/// GPU buffers are allocated in 4 byte units.
pub const UPLOAD_ALIGNMENT: usize = wgpu::COPY_BUFFER_ALIGNMENT as usize;

#[derive(Debug)]
pub struct BufferView {
    pub index: usize,
    pub name: Option<String>,
    raw: RawBuffer,
    range: Range<usize>,
    /// Declared stride, zero when tightly packed.
    pub stride: usize,
    usage: wgpu::BufferUsages,
    gpu: Option<wgpu::Buffer>,
}

impl BufferView {
    pub fn new(index: usize, raw: &RawBuffer, descriptor: &BufferViewDescriptor) -> Result<Self> {
        if descriptor.buffer != 0 {
            return Err(LoadError::Schema(format!(
                "buffer view {index} references external buffer {}",
                descriptor.buffer
            )));
        }
        let start = descriptor.byte_offset.unwrap_or(0);
        let end = start.checked_add(descriptor.byte_length).ok_or_else(|| {
            LoadError::Schema(format!(
                "buffer view {index} has byte offset {start} and length {}, which overflows",
                descriptor.byte_length
            ))
        })?;
        if end > raw.len() {
            return Err(LoadError::Schema(format!(
                "buffer view {index} spans bytes {start}..{end} but the BIN chunk has {}",
                raw.len()
            )));
        }
        Ok(Self {
            index,
            name: descriptor.name.clone(),
            raw: raw.clone(),
            range: start..end,
            stride: descriptor.byte_stride.unwrap_or(0),
            usage: wgpu::BufferUsages::empty(),
            gpu: None,
        })
    }

    /// Builds one view per descriptor, in declaration order.
    pub fn collect(raw: &RawBuffer, descriptors: &[BufferViewDescriptor]) -> Result<Vec<Self>> {
        descriptors
            .iter()
            .enumerate()
            .map(|(index, descriptor)| Self::new(index, raw, descriptor))
            .collect()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.raw.as_slice()[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Registers an intended GPU usage. Repeated claims are merged.
    pub fn add_usage(&mut self, usage: wgpu::BufferUsages) {
        self.usage |= usage;
    }

    pub fn usage(&self) -> wgpu::BufferUsages {
        self.usage
    }

    /// True while the view is claimed but not resident yet.
    pub fn needs_upload(&self) -> bool {
        !self.usage.is_empty() && self.gpu.is_none()
    }

    pub fn is_resident(&self) -> bool {
        self.gpu.is_some()
    }

    /// Size of the GPU allocation: the view length rounded up to 4 bytes.
    pub fn upload_size(&self) -> u64 {
        self.len().next_multiple_of(UPLOAD_ALIGNMENT) as u64
    }

    /// Copies the view into a GPU buffer carrying the accumulated usages.
    ///
    /// Does nothing for views that are unclaimed or already resident.
    pub fn upload(&mut self, device: &wgpu::Device) {
        if !self.needs_upload() {
            return;
        }
        let label = match &self.name {
            Some(name) => format!("{name} (buffer view {})", self.index),
            None => format!("buffer view {}", self.index),
        };
        // create_buffer_init zero-pads the allocation to COPY_BUFFER_ALIGNMENT
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&label),
            contents: self.bytes(),
            usage: self.usage,
        });
        log::debug!(
            "uploaded {label}: {} bytes, usage {:?}",
            self.upload_size(),
            self.usage
        );
        self.gpu = Some(buffer);
    }

    pub fn gpu_buffer(&self) -> Option<&wgpu::Buffer> {
        self.gpu.as_ref()
    }
}

/// Uploads every claimed view. Returns how many views became resident.
pub fn upload_claimed(views: &mut [BufferView], device: &wgpu::Device) -> usize {
    let mut uploaded = 0;
    for view in views.iter_mut().filter(|view| view.needs_upload()) {
        view.upload(device);
        uploaded += 1;
    }
    uploaded
}
