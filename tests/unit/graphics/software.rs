use super::*;

fn unit() -> Region {
    Region::from_size(1, 1)
}

fn draw(
    d: &mut SoftwareDriver,
    target: SurfaceHandle,
    sources: [Option<SurfaceHandle>; SHADER_IMAGE_COUNT],
    src_regions: [Option<Region>; SHADER_IMAGE_COUNT],
    program: ProgramHandle,
    dst: Region,
    src: Region,
) -> anyhow::Result<()> {
    let vertices = crate::graphics::geometry::quad_vertices(dst, src, [1.0; 4]);
    let indices = crate::graphics::geometry::quad_indices();
    d.execute_draw(&DrawCall {
        target,
        sources,
        vertices: &vertices,
        indices: &indices,
        blend: crate::graphics::blend::BlendMode::SourceOver,
        dst_region: dst,
        src_regions,
        program,
        uniforms: &[],
        allow_overflow: false,
    })
}

#[test]
fn fresh_surfaces_are_transparent() {
    let mut d = SoftwareDriver::new();
    let s = d.allocate_surface(2, 2).unwrap();
    assert_eq!(d.read_pixels(s, Region::from_size(2, 2)).unwrap(), vec![0; 16]);
    assert!(d.allocate_surface(0, 1).is_err());
}

#[test]
fn write_then_read_region() {
    let mut d = SoftwareDriver::new();
    let s = d.allocate_surface(2, 2).unwrap();
    d.write_pixels(s, &[1, 2, 3, 4], Region::new(1, 1, 1, 1))
        .unwrap();
    assert_eq!(
        d.read_pixels(s, Region::new(1, 1, 1, 1)).unwrap(),
        vec![1, 2, 3, 4]
    );
    assert_eq!(
        d.read_pixels(s, Region::new(0, 0, 1, 1)).unwrap(),
        vec![0; 4]
    );
    assert!(d.write_pixels(s, &[0; 4], Region::new(2, 0, 1, 1)).is_err());
    assert!(d.write_pixels(s, &[0; 3], Region::new(0, 0, 1, 1)).is_err());
}

#[test]
fn quad_covers_each_pixel_once() {
    let mut d = SoftwareDriver::new();
    let target = d.allocate_surface(3, 2).unwrap();
    let program = d.compile_shader(&SoftwareProgram::Fill([10, 0, 0, 10])).unwrap();
    let vertices = crate::graphics::geometry::quad_vertices(
        Region::from_size(3, 2),
        Region::from_size(3, 2),
        [1.0; 4],
    );
    let indices = crate::graphics::geometry::quad_indices();
    d.execute_draw(&DrawCall {
        target,
        sources: [None; SHADER_IMAGE_COUNT],
        vertices: &vertices,
        indices: &indices,
        blend: crate::graphics::blend::BlendMode::Lighter,
        dst_region: Region::from_size(3, 2),
        src_regions: [None; SHADER_IMAGE_COUNT],
        program,
        uniforms: &[],
        allow_overflow: false,
    })
    .unwrap();
    let px = d.read_pixels(target, Region::from_size(3, 2)).unwrap();
    for chunk in px.chunks_exact(4) {
        assert_eq!(chunk, &[10, 0, 0, 10]);
    }
}

#[test]
fn texture_copies_source() {
    let mut d = SoftwareDriver::new();
    let src = d.allocate_surface(1, 1).unwrap();
    let dst = d.allocate_surface(1, 1).unwrap();
    d.write_pixels(src, &[255, 0, 0, 255], unit()).unwrap();
    let program = d.compile_shader(&SoftwareProgram::Texture).unwrap();
    draw(
        &mut d,
        dst,
        [Some(src), None, None, None],
        [None; SHADER_IMAGE_COUNT],
        program,
        unit(),
        unit(),
    )
    .unwrap();
    assert_eq!(d.read_pixels(dst, unit()).unwrap(), vec![255, 0, 0, 255]);
}

#[test]
fn source_regions_do_not_leak() {
    let mut d = SoftwareDriver::new();
    let src = d.allocate_surface(2, 1).unwrap();
    d.write_pixels(src, &[255, 0, 0, 255, 0, 255, 0, 255], Region::from_size(2, 1))
        .unwrap();
    let dst = d.allocate_surface(2, 1).unwrap();
    let program = d.compile_shader(&SoftwareProgram::Texture).unwrap();

    // Geometry samples both texels but only the second is declared.
    let right = Region::new(1, 0, 1, 1);
    draw(
        &mut d,
        dst,
        [Some(src), None, None, None],
        [Some(right), None, None, None],
        program,
        Region::from_size(2, 1),
        Region::from_size(2, 1),
    )
    .unwrap();
    assert_eq!(
        d.read_pixels(dst, Region::from_size(2, 1)).unwrap(),
        vec![0, 0, 0, 0, 0, 255, 0, 255]
    );
}

#[test]
fn images_program_offsets_each_slot() {
    let mut d = SoftwareDriver::new();
    let src = d.allocate_surface(2, 1).unwrap();
    d.write_pixels(src, &[0x40, 0, 0, 0x40, 0, 0x80, 0, 0x80], Region::from_size(2, 1))
        .unwrap();
    let dst = d.allocate_surface(1, 1).unwrap();
    let program = d.compile_shader(&SoftwareProgram::Images(2)).unwrap();
    draw(
        &mut d,
        dst,
        [Some(src), Some(src), None, None],
        [Some(Region::new(0, 0, 1, 1)), Some(Region::new(1, 0, 1, 1)), None, None],
        program,
        unit(),
        unit(),
    )
    .unwrap();
    assert_eq!(d.read_pixels(dst, unit()).unwrap(), vec![0x40, 0x80, 0, 0xc0]);
}

#[test]
fn scissor_limits_writes_unless_overflow() {
    let mut d = SoftwareDriver::new();
    let target = d.allocate_surface(2, 1).unwrap();
    let program = d.compile_shader(&SoftwareProgram::Fill([9, 9, 9, 9])).unwrap();
    let full = Region::from_size(2, 1);
    let vertices = crate::graphics::geometry::quad_vertices(full, full, [1.0; 4]);
    let indices = crate::graphics::geometry::quad_indices();
    let mut call = DrawCall {
        target,
        sources: [None; SHADER_IMAGE_COUNT],
        vertices: &vertices,
        indices: &indices,
        blend: crate::graphics::blend::BlendMode::Copy,
        dst_region: Region::new(0, 0, 1, 1),
        src_regions: [None; SHADER_IMAGE_COUNT],
        program,
        uniforms: &[],
        allow_overflow: false,
    };
    d.execute_draw(&call).unwrap();
    assert_eq!(d.read_pixels(target, full).unwrap(), vec![9, 9, 9, 9, 0, 0, 0, 0]);

    call.allow_overflow = true;
    d.execute_draw(&call).unwrap();
    assert_eq!(d.read_pixels(target, full).unwrap(), vec![9; 8]);
}

#[test]
fn uniform_color_program() {
    let mut d = SoftwareDriver::new();
    let target = d.allocate_surface(1, 1).unwrap();
    let program = d.compile_shader(&SoftwareProgram::UniformColor).unwrap();
    let vertices = crate::graphics::geometry::quad_vertices(unit(), unit(), [1.0; 4]);
    let indices = crate::graphics::geometry::quad_indices();
    d.execute_draw(&DrawCall {
        target,
        sources: [None; SHADER_IMAGE_COUNT],
        vertices: &vertices,
        indices: &indices,
        blend: crate::graphics::blend::BlendMode::Copy,
        dst_region: unit(),
        src_regions: [None; SHADER_IMAGE_COUNT],
        program,
        uniforms: &[1, 2, 300, 255],
        allow_overflow: false,
    })
    .unwrap();
    assert_eq!(d.read_pixels(target, unit()).unwrap(), vec![1, 2, 255, 255]);
}

#[test]
fn context_loss_drops_everything_and_latches_once() {
    let mut d = SoftwareDriver::new();
    let s = d.allocate_surface(1, 1).unwrap();
    d.compile_shader(&SoftwareProgram::Texture).unwrap();
    assert!(!d.is_context_lost());

    d.lose_context();
    assert_eq!(d.surface_count(), 0);
    assert_eq!(d.program_count(), 0);
    assert!(d.read_pixels(s, unit()).is_err());
    assert!(d.is_context_lost());
    assert!(!d.is_context_lost());

    let fresh = d.allocate_surface(1, 1).unwrap();
    assert_ne!(fresh, s);
    assert_eq!(d.stats().context_losses, 1);
}

#[test]
fn rejects_bad_draws() {
    let mut d = SoftwareDriver::new();
    let s = d.allocate_surface(1, 1).unwrap();
    let p = d.compile_shader(&SoftwareProgram::Texture).unwrap();
    let self_draw = draw(
        &mut d,
        s,
        [Some(s), None, None, None],
        [None; SHADER_IMAGE_COUNT],
        p,
        unit(),
        unit(),
    );
    assert!(self_draw.is_err());

    let unknown_program = draw(
        &mut d,
        s,
        [None; SHADER_IMAGE_COUNT],
        [None; SHADER_IMAGE_COUNT],
        ProgramHandle(999),
        unit(),
        unit(),
    );
    assert!(unknown_program.is_err());
    assert!(d.compile_shader(&SoftwareProgram::Images(5)).is_err());
}

#[test]
fn injected_failures() {
    let mut d = SoftwareDriver::new();
    let s = d.allocate_surface(1, 1).unwrap();
    d.fail_read_pixels(true);
    assert!(d.read_pixels(s, unit()).is_err());
    d.fail_read_pixels(false);
    assert!(d.read_pixels(s, unit()).is_ok());

    d.set_surface_limit(Some(1));
    assert!(d.allocate_surface(1, 1).is_err());
    d.set_surface_limit(None);
    assert!(d.allocate_surface(1, 1).is_ok());
    assert_eq!(d.stats().surfaces_allocated, 2);
    assert_eq!(d.stats().pixel_reads, 1);
}

#[test]
fn oversized_surface_fails_instead_of_panicking() {
    let mut d = SoftwareDriver::new();
    assert!(d.allocate_surface(u32::MAX, u32::MAX).is_err());
    assert_eq!(d.surface_count(), 0);
    assert_eq!(d.stats().surfaces_allocated, 0);
}
