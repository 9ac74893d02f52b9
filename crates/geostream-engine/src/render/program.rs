use super::Mesh;

/// Everything needed to compile a WGSL module into a render pipeline.
///
/// Entry points default to `vs_main` / `fs_main`. One color target is created
/// per entry of `targets`, all sharing `blend`.
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub source: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub topology: wgpu::PrimitiveTopology,
    pub vertex_layouts: &'a [wgpu::VertexBufferLayout<'a>],
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub targets: &'a [wgpu::TextureFormat],
    pub blend: Option<wgpu::BlendState>,
}

impl<'a> ProgramDesc<'a> {
    pub fn new(label: &'a str, source: &'a str, topology: wgpu::PrimitiveTopology) -> Self {
        Self {
            label,
            source,
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            topology,
            vertex_layouts: &[],
            bind_group_layouts: &[],
            targets: &[],
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        }
    }
}

/// A compiled shader program: pipeline plus the bind groups it draws with.
///
/// No depth-stencil state is attached; programs draw in submission order.
pub struct Program {
    pipeline: wgpu::RenderPipeline,
}

impl Program {
    pub fn new(device: &wgpu::Device, desc: &ProgramDesc<'_>) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.source.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: desc.bind_group_layouts,
            immediate_size: 0,
        });

        let targets: Vec<Option<wgpu::ColorTargetState>> = desc
            .targets
            .iter()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend: desc.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(desc.vertex_entry),
                compilation_options: Default::default(),
                buffers: desc.vertex_layouts,
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(desc.fragment_entry),
                compilation_options: Default::default(),
                targets: &targets,
            }),

            primitive: wgpu::PrimitiveState {
                topology: desc.topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("compiled program `{}`", desc.label);
        Self { pipeline }
    }

    /// Compiles a program whose vertex input and topology come from `mesh`.
    pub fn for_mesh<H>(
        device: &wgpu::Device,
        mesh: &Mesh<H>,
        source: &str,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        targets: &[wgpu::TextureFormat],
    ) -> Self {
        let layouts = mesh.vertex_layouts();
        let mut desc = ProgramDesc::new(mesh.label(), source, mesh.draw_call().topology);
        desc.vertex_layouts = &layouts;
        desc.bind_group_layouts = bind_group_layouts;
        desc.targets = targets;
        Self::new(device, &desc)
    }

    /// Sets the pipeline and bind groups (group `i` = `bind_groups[i]`) and records `mesh`.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, mesh: &Mesh, bind_groups: &[&wgpu::BindGroup]) {
        if mesh.draw_call().is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        for (i, group) in bind_groups.iter().enumerate() {
            pass.set_bind_group(i as u32, *group, &[]);
        }
        mesh.record(pass);
    }
}
