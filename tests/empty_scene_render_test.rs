//! Renders one frame of the startup scene (floor and lights only, no model
//! load completed) offscreen and checks the background survives.

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_empty_scene_background() {
    use std::iter;

    use cgmath::{Deg, Vector3};
    use glade::camera::{Camera, CameraResources, Projection};
    use glade::data_structures::{scene::Scene, texture::Texture};
    use glade::pipelines::{
        Pipelines,
        light::{LightResources, LightUniform},
    };
    use glade::resources::diffuse_layout;

    const WIDTH: u32 = 512;
    const HEIGHT: u32 = 512;
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    let (device, queue) = futures::executor::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .expect("no adapter available for the integration test");
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("no device available for the integration test")
    });

    let projection = Projection::new(WIDTH, HEIGHT, Deg(50.0), 0.1, 100.0);
    let mut camera = CameraResources::new(
        &device,
        Camera::new((-20.0, 30.0, 50.0), (0.0, 0.0, 0.0)),
        &projection,
    );
    let light = LightResources::new(
        &device,
        LightUniform::new(0.8, 0.6, Vector3::new(5.0, 5.0, 5.0)),
    );
    let pipelines = Pipelines::new(&device, FORMAT);
    let material_layout = diffuse_layout(&device);

    // Only the synchronous startup content; both model loads are "pending".
    let scene = Scene::new(&device, &queue, &material_layout, [50.0, 1.0, 50.0]);
    assert!(scene.models.is_empty());

    camera.uniform.update_view_proj(&camera.camera, &projection);
    queue.write_buffer(&camera.buffer, 0, bytemuck::cast_slice(&[camera.uniform]));

    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Integration Test Target"),
        size: wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = Texture::create_depth_texture(&device, [WIDTH, HEIGHT], "integration test depth");

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Integration Test Encoder"),
    });
    {
        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &light.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        shadow_pass.set_pipeline(&pipelines.shadow);
        scene.draw_depth(&mut shadow_pass, &light.shadow_bind_group);
    }
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(scene.background),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&pipelines.scene);
        scene.draw(&mut render_pass, &camera.bind_group, &light.bind_group);
    }

    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: None,
        size: (4 * WIDTH * HEIGHT) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * WIDTH),
                rows_per_image: Some(HEIGHT),
            },
        },
        wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
    );

    queue.submit(iter::once(encoder.finish()));

    let buffer_slice = output_buffer.slice(..);
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).unwrap();
    });
    device
        .poll(wgpu::PollType::Wait)
        .unwrap();
    futures::executor::block_on(rx.receive()).unwrap().unwrap();

    let data = buffer_slice.get_mapped_range();
    // The top-left corner looks past the floor into the white background.
    assert_eq!(&data[0..4], &[255, 255, 255, 255]);
    // The frame is fully opaque end to end.
    for pixel in data.chunks_exact(4) {
        assert_eq!(pixel[3], 255);
    }
}
