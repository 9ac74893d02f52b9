use anyhow::{bail, ensure, Context, Result};
use bytemuck::Pod;

use crate::buffer::{BufferAllocator, DynamicBuffer, SizePolicy, Upload};

/// Which part of the draw call a stream's length controls.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DrawCount {
    /// Plain attribute data; its length does not affect the draw.
    Nothing,
    /// Vertex count of an unindexed draw.
    Elements,
    /// Instance count.
    Instances,
}

/// Layout of one attribute stream: a single shader attribute backed by its own buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StreamLayout {
    pub name: &'static str,
    pub location: u32,
    pub format: wgpu::VertexFormat,
    pub step_mode: wgpu::VertexStepMode,
    pub policy: SizePolicy,
    pub drives: DrawCount,
}

impl StreamLayout {
    /// Per-vertex attribute with grow-only storage.
    pub fn vertex(name: &'static str, location: u32, format: wgpu::VertexFormat) -> Self {
        Self {
            name,
            location,
            format,
            step_mode: wgpu::VertexStepMode::Vertex,
            policy: SizePolicy::GrowOnly,
            drives: DrawCount::Nothing,
        }
    }

    /// Per-instance attribute that sets the instance count, stored exact-fit.
    pub fn instance(name: &'static str, location: u32, format: wgpu::VertexFormat) -> Self {
        Self {
            name,
            location,
            format,
            step_mode: wgpu::VertexStepMode::Instance,
            policy: SizePolicy::ExactFit,
            drives: DrawCount::Instances,
        }
    }

    /// Storage policy for a stream that does not size the draw. Ignored for
    /// count-driving streams, which stay exact-fit.
    pub fn with_policy(mut self, policy: SizePolicy) -> Self {
        if self.drives == DrawCount::Nothing {
            self.policy = policy;
        }
        self
    }

    /// Makes the stream's length set `drives`. A stream that sizes the draw is
    /// always stored exact-fit, so its capacity matches the count it sets.
    pub fn driving(mut self, drives: DrawCount) -> Self {
        self.drives = drives;
        if drives != DrawCount::Nothing {
            self.policy = SizePolicy::ExactFit;
        }
        self
    }

    /// Bytes per element.
    #[inline]
    pub fn element_size(&self) -> u64 {
        self.format.size()
    }
}

/// Draw call descriptor for one mesh submission.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCall {
    pub topology: wgpu::PrimitiveTopology,
    /// Vertices (unindexed) or indices (indexed) read by the draw.
    pub count: u32,
    pub instances: u32,
    pub indexed: bool,
}

impl DrawCall {
    /// Returns `true` if submitting this draw would not rasterize anything.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.instances == 0
    }
}

struct Stream<H> {
    layout: StreamLayout,
    attributes: [wgpu::VertexAttribute; 1],
    buffer: DynamicBuffer<H>,
}

/// Attribute streams + optional index stream + draw descriptor.
///
/// Every stream lives in its own [`DynamicBuffer`]; stream `i` binds to vertex
/// buffer slot `i`. Updating the index stream, or a stream marked as driving a
/// count, updates the draw descriptor in the same call, so the draw never reads
/// past the data most recently written.
pub struct Mesh<H = wgpu::Buffer> {
    label: String,
    streams: Vec<Stream<H>>,
    indices: Option<DynamicBuffer<H>>,
    draw: DrawCall,
}

impl Mesh {
    pub fn builder(label: impl Into<String>, topology: wgpu::PrimitiveTopology) -> MeshBuilder {
        MeshBuilder {
            label: label.into(),
            topology,
            streams: Vec::new(),
            indexed: false,
            instances: 1,
        }
    }
}

impl<H> Mesh<H> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn draw_call(&self) -> DrawCall {
        self.draw
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Slot index of the stream named `name`.
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.streams.iter().position(|s| s.layout.name == name)
    }

    pub fn stream(&self, slot: usize) -> Option<&DynamicBuffer<H>> {
        self.streams.get(slot).map(|s| &s.buffer)
    }

    pub fn indices(&self) -> Option<&DynamicBuffer<H>> {
        self.indices.as_ref()
    }

    /// Vertex buffer layouts in slot order, for pipeline creation.
    pub fn vertex_layouts(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.streams
            .iter()
            .map(|s| wgpu::VertexBufferLayout {
                array_stride: s.layout.element_size(),
                step_mode: s.layout.step_mode,
                attributes: &s.attributes,
            })
            .collect()
    }

    /// Uploads one attribute stream.
    ///
    /// `T` is one whole element of the stream's format (e.g. `[f32; 2]` for
    /// `Float32x2`, `[u8; 4]` for `Unorm8x4`).
    pub fn update_stream<A, T>(&mut self, alloc: &A, slot: usize, data: &[T]) -> Result<Upload>
    where
        A: BufferAllocator<Handle = H>,
        T: Pod,
    {
        let Some(stream) = self.streams.get_mut(slot) else {
            bail!("mesh `{}` has no stream in slot {slot}", self.label);
        };

        let upload = stream
            .buffer
            .update(alloc, data)
            .with_context(|| format!("mesh `{}`", self.label))?;

        match stream.layout.drives {
            DrawCount::Nothing => {}
            DrawCount::Elements => self.draw.count = count_u32(data.len())?,
            DrawCount::Instances => self.draw.instances = count_u32(data.len())?,
        }
        Ok(upload)
    }

    /// Uploads the index stream and sets the draw count to `indices.len()`.
    pub fn update_indices<A>(&mut self, alloc: &A, indices: &[u32]) -> Result<Upload>
    where
        A: BufferAllocator<Handle = H>,
    {
        let Some(buffer) = self.indices.as_mut() else {
            bail!("mesh `{}` is not indexed", self.label);
        };

        let upload = buffer
            .update(alloc, indices)
            .with_context(|| format!("mesh `{}`", self.label))?;

        self.draw.count = count_u32(indices.len())?;
        Ok(upload)
    }

    /// Sets the vertex count of a draw no stream controls (e.g. vertices
    /// generated entirely from `vertex_index`).
    pub fn set_count(&mut self, count: u32) {
        debug_assert!(
            !self.draw.indexed
                && !self.streams.iter().any(|s| s.layout.drives == DrawCount::Elements),
            "count of mesh `{}` is driven by a stream",
            self.label
        );
        self.draw.count = count;
    }

    /// Sets a fixed instance count.
    pub fn set_instances(&mut self, instances: u32) {
        debug_assert!(
            !self.streams.iter().any(|s| s.layout.drives == DrawCount::Instances),
            "instances of mesh `{}` are driven by a stream",
            self.label
        );
        self.draw.instances = instances;
    }
}

impl Mesh<wgpu::Buffer> {
    /// Binds all streams and issues the draw described by [`Self::draw_call`].
    ///
    /// Nothing is recorded if the draw is empty or a stream has never been uploaded.
    pub fn record(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.draw.is_empty() {
            return;
        }

        for (slot, stream) in self.streams.iter().enumerate() {
            let Some(buffer) = stream.buffer.handle() else { return };
            let bytes = stream.buffer.byte_len();
            if bytes == 0 {
                return;
            }
            pass.set_vertex_buffer(slot as u32, buffer.slice(..bytes));
        }

        let instances = 0..self.draw.instances;
        match &self.indices {
            Some(ibo) => {
                let Some(buffer) = ibo.handle() else { return };
                pass.set_index_buffer(buffer.slice(..ibo.byte_len()), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.draw.count, 0, instances);
            }
            None => pass.draw(0..self.draw.count, instances),
        }
    }
}

fn count_u32(len: usize) -> Result<u32> {
    u32::try_from(len).with_context(|| format!("{len} elements exceed the draw count range"))
}

/// Builder for [`Mesh`].
pub struct MeshBuilder {
    label: String,
    topology: wgpu::PrimitiveTopology,
    streams: Vec<StreamLayout>,
    indexed: bool,
    instances: u32,
}

impl MeshBuilder {
    /// Adds an attribute stream in the next vertex buffer slot.
    pub fn stream(mut self, layout: StreamLayout) -> Self {
        self.streams.push(layout);
        self
    }

    /// Adds an exact-fit `u32` index stream; the index count drives the draw.
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Fixed instance count (default 1).
    pub fn instances(mut self, instances: u32) -> Self {
        self.instances = instances;
        self
    }

    pub fn build<H>(self) -> Result<Mesh<H>> {
        let Self {
            label,
            topology,
            streams,
            indexed,
            instances,
        } = self;

        let drivers = |count: DrawCount| streams.iter().filter(|s| s.drives == count).count();
        ensure!(
            drivers(DrawCount::Elements) <= 1,
            "mesh `{label}`: more than one stream drives the vertex count"
        );
        ensure!(
            drivers(DrawCount::Instances) <= 1,
            "mesh `{label}`: more than one stream drives the instance count"
        );
        ensure!(
            !(indexed && drivers(DrawCount::Elements) > 0),
            "mesh `{label}`: indexed meshes take their count from the index stream"
        );

        for (i, s) in streams.iter().enumerate() {
            let expected = match s.drives {
                DrawCount::Nothing => s.step_mode,
                DrawCount::Elements => wgpu::VertexStepMode::Vertex,
                DrawCount::Instances => wgpu::VertexStepMode::Instance,
            };
            ensure!(
                s.step_mode == expected,
                "mesh `{label}`: stream `{}` drives {:?} but steps per {:?}",
                s.name,
                s.drives,
                s.step_mode
            );
            ensure!(
                streams[..i].iter().all(|o| o.location != s.location),
                "mesh `{label}`: shader location {} bound twice",
                s.location
            );
        }

        let instances = if drivers(DrawCount::Instances) > 0 { 0 } else { instances };

        let streams = streams
            .into_iter()
            .map(|layout| Stream {
                attributes: [wgpu::VertexAttribute {
                    format: layout.format,
                    offset: 0,
                    shader_location: layout.location,
                }],
                buffer: DynamicBuffer::new(
                    format!("{label} {}", layout.name),
                    wgpu::BufferUsages::VERTEX,
                    layout.policy,
                    layout.element_size(),
                ),
                layout,
            })
            .collect();

        let indices = indexed.then(|| {
            DynamicBuffer::new(
                format!("{label} indices"),
                wgpu::BufferUsages::INDEX,
                SizePolicy::ExactFit,
                std::mem::size_of::<u32>() as u64,
            )
        });

        Ok(Mesh {
            draw: DrawCall {
                topology,
                count: 0,
                instances,
                indexed,
            },
            label,
            streams,
            indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::testing::RecordingAllocator;

    const POS: usize = 0;
    const COLOR: usize = 1;

    fn line_mesh() -> Mesh<usize> {
        Mesh::builder("lines", wgpu::PrimitiveTopology::LineList)
            .stream(StreamLayout::vertex("inVert", 0, wgpu::VertexFormat::Float32x2))
            .stream(StreamLayout::vertex("inColor", 1, wgpu::VertexFormat::Unorm8x4))
            .indexed()
            .build()
            .unwrap()
    }

    #[test]
    fn index_update_sets_draw_count() {
        let alloc = RecordingAllocator::default();
        let mut mesh = line_mesh();
        mesh.update_indices(&alloc, &[0, 0]).unwrap();
        assert_eq!(mesh.draw_call().count, 2);

        let up = mesh.update_indices(&alloc, &[0, 1, 2, 1]).unwrap();
        assert_eq!(up, Upload::Orphaned { previous: 8, capacity: 16 });
        assert_eq!(mesh.draw_call().count, 4);
        assert_eq!(mesh.indices().unwrap().capacity(), 16);
    }

    #[test]
    fn shrinking_indices_shrink_count_and_capacity() {
        let alloc = RecordingAllocator::default();
        let mut mesh = line_mesh();
        mesh.update_indices(&alloc, &[0u32; 30]).unwrap();
        mesh.update_indices(&alloc, &[1, 2]).unwrap();

        let ibo = mesh.indices().unwrap();
        assert_eq!(ibo.capacity(), 8);
        assert_eq!(mesh.draw_call().count, 2);
        assert_eq!(alloc.read::<u32>(ibo.handle().unwrap(), 2), vec![1, 2]);
    }

    #[test]
    fn attribute_streams_do_not_touch_count() {
        let alloc = RecordingAllocator::default();
        let mut mesh = line_mesh();
        mesh.update_indices(&alloc, &[0, 1]).unwrap();
        mesh.update_stream(&alloc, POS, &[[0.0f32; 2]; 4]).unwrap();
        mesh.update_stream(&alloc, COLOR, &[[255u8, 0, 0, 255]; 4]).unwrap();

        assert_eq!(mesh.draw_call().count, 2);
        assert_eq!(mesh.stream(POS).unwrap().capacity(), 32);
        assert_eq!(mesh.stream(COLOR).unwrap().capacity(), 16);

        // Grow-only: three vertices fit in the four-vertex allocation.
        let up = mesh.update_stream(&alloc, POS, &[[1.0f32; 2]; 3]).unwrap();
        assert_eq!(up, Upload::Reused);
        assert_eq!(mesh.stream(POS).unwrap().byte_len(), 24);
    }

    #[test]
    fn vertex_count_driving_stream_is_exact_fit() {
        let alloc = RecordingAllocator::default();
        let mut mesh: Mesh<usize> = Mesh::builder("points", wgpu::PrimitiveTopology::PointList)
            .stream(
                StreamLayout::vertex("inVert", 0, wgpu::VertexFormat::Float32x2)
                    .driving(DrawCount::Elements),
            )
            .build()
            .unwrap();

        mesh.update_stream(&alloc, 0, &[[0.0f32; 2]; 4]).unwrap();
        assert_eq!(mesh.draw_call().count, 4);

        let up = mesh.update_stream(&alloc, 0, &[[0.0f32; 2]; 2]).unwrap();
        assert!(up.orphaned());
        assert_eq!(mesh.draw_call().count, 2);
        assert_eq!(mesh.stream(0).unwrap().capacity(), 16);
    }

    #[test]
    fn instance_stream_drives_instances() {
        let alloc = RecordingAllocator::default();
        let mut mesh: Mesh<usize> = Mesh::builder("grid", wgpu::PrimitiveTopology::LineList)
            .stream(StreamLayout::instance("inAnchor", 0, wgpu::VertexFormat::Float32x2))
            .build()
            .unwrap();
        mesh.set_count(256);
        assert!(mesh.draw_call().is_empty());

        mesh.update_stream(&alloc, 0, &[[-1.0f32, -1.0], [-0.89, -0.89]]).unwrap();
        let draw = mesh.draw_call();
        assert_eq!((draw.count, draw.instances), (256, 2));
        assert!(!draw.is_empty());
    }

    #[test]
    fn shrinking_instance_stream_shrinks_capacity() {
        let alloc = RecordingAllocator::default();
        let mut mesh: Mesh<usize> = Mesh::builder("grid", wgpu::PrimitiveTopology::LineList)
            .stream(StreamLayout::instance("inAnchor", 0, wgpu::VertexFormat::Float32x2))
            .build()
            .unwrap();
        mesh.set_count(256);

        mesh.update_stream(&alloc, 0, &[[0.0f32; 2]; 4]).unwrap();
        assert_eq!(mesh.stream(0).unwrap().capacity(), 4 * 8);

        let up = mesh.update_stream(&alloc, 0, &[[0.5f32; 2]; 2]).unwrap();
        assert!(up.orphaned());
        assert_eq!(mesh.stream(0).unwrap().capacity(), 2 * 8);
        assert_eq!(mesh.draw_call().instances, 2);
    }

    #[test]
    fn count_driving_streams_ignore_other_policies() {
        let instance = StreamLayout::instance("inAnchor", 0, wgpu::VertexFormat::Float32x2)
            .with_policy(SizePolicy::GrowOnly);
        assert_eq!(instance.policy, SizePolicy::ExactFit);

        let driven = StreamLayout {
            step_mode: wgpu::VertexStepMode::Instance,
            ..StreamLayout::vertex("inOffset", 1, wgpu::VertexFormat::Float32x2)
        }
        .driving(DrawCount::Instances);
        assert_eq!(driven.policy, SizePolicy::ExactFit);

        let plain = StreamLayout::vertex("inColor", 2, wgpu::VertexFormat::Unorm8x4)
            .with_policy(SizePolicy::Geometric { min_bytes: 64 });
        assert_eq!(plain.policy, SizePolicy::Geometric { min_bytes: 64 });
    }

    #[test]
    fn fixed_instances_are_kept() {
        let mesh: Mesh<usize> = Mesh::builder("target", wgpu::PrimitiveTopology::LineList)
            .stream(StreamLayout::vertex("inVert", 0, wgpu::VertexFormat::Float32x2))
            .instances(10)
            .build()
            .unwrap();
        assert_eq!(mesh.draw_call().instances, 10);
    }

    #[test]
    fn empty_index_upload_empties_the_draw() {
        let alloc = RecordingAllocator::default();
        let mut mesh = line_mesh();
        mesh.update_indices(&alloc, &[0, 1]).unwrap();
        mesh.update_indices(&alloc, &[]).unwrap();
        assert!(mesh.draw_call().is_empty());
    }

    #[test]
    fn vertex_layouts_follow_slots() {
        let mesh = line_mesh();
        let layouts = mesh.vertex_layouts();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].array_stride, 8);
        assert_eq!(layouts[1].array_stride, 4);
        assert_eq!(layouts[1].attributes[0].shader_location, 1);
        assert_eq!(mesh.slot("inColor"), Some(COLOR));
        assert_eq!(mesh.slot("inUV"), None);
    }

    // ── errors ────────────────────────────────────────────────────────────

    #[test]
    fn unknown_slot_is_an_error() {
        let alloc = RecordingAllocator::default();
        let mut mesh = line_mesh();
        let err = mesh.update_stream(&alloc, 7, &[[0.0f32; 2]]).unwrap_err();
        assert!(err.to_string().contains("slot 7"));
    }

    #[test]
    fn wrong_element_type_names_mesh_and_stream() {
        let alloc = RecordingAllocator::default();
        let mut mesh = line_mesh();
        let err = mesh.update_stream(&alloc, POS, &[0.0f32; 4]).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("mesh `lines`"));
        assert!(msg.contains("lines inVert"));
    }

    #[test]
    fn unindexed_mesh_rejects_indices() {
        let alloc = RecordingAllocator::default();
        let mut mesh: Mesh<usize> = Mesh::builder("quad", wgpu::PrimitiveTopology::TriangleList)
            .build()
            .unwrap();
        assert!(mesh.update_indices(&alloc, &[0, 1, 2]).is_err());
    }

    #[test]
    fn builder_rejects_conflicting_count_sources() {
        let driving = StreamLayout::vertex("inVert", 0, wgpu::VertexFormat::Float32x2)
            .driving(DrawCount::Elements);

        let indexed = Mesh::builder("a", wgpu::PrimitiveTopology::PointList)
            .stream(driving)
            .indexed()
            .build::<usize>();
        assert!(indexed.is_err());

        let twice = Mesh::builder("b", wgpu::PrimitiveTopology::PointList)
            .stream(driving)
            .stream(StreamLayout { location: 1, ..driving })
            .build::<usize>();
        assert!(twice.is_err());
    }

    #[test]
    fn builder_rejects_duplicate_locations_and_bad_step_mode() {
        let dup = Mesh::builder("c", wgpu::PrimitiveTopology::PointList)
            .stream(StreamLayout::vertex("a", 0, wgpu::VertexFormat::Float32x2))
            .stream(StreamLayout::vertex("b", 0, wgpu::VertexFormat::Float32x2))
            .build::<usize>();
        assert!(dup.is_err());

        let step = Mesh::builder("d", wgpu::PrimitiveTopology::PointList)
            .stream(
                StreamLayout::vertex("a", 0, wgpu::VertexFormat::Float32x2)
                    .driving(DrawCount::Instances),
            )
            .build::<usize>();
        assert!(step.is_err());
    }
}
