use refrakt::{
    FlattenedShapeBuffer, GPU_MAX_BOUNCES, Point, RayState, SHAPE_TEXTURE_LAYOUT_VERSION, Shape,
    ShapeSet, ShapeTextures, TracerConfig, VertexTransform, encode_shapes, render_light_path,
    trace_refractions,
};

fn logo() -> ShapeSet {
    ShapeSet::from_json_str(include_str!("data/logo.json")).unwrap()
}

#[test]
fn fixture_loads_with_degenerate_shape_dropped() {
    let set = logo();
    assert_eq!(set.len(), 3);
    let lens: Vec<usize> = set.iter().map(Shape::len).collect();
    // The hexagon's closing point repeats its first and is removed.
    assert_eq!(lens, vec![4, 3, 6]);
}

#[test]
fn encoded_runs_reproduce_shape_points() {
    let set = logo();
    let buffer = encode_shapes(set.shapes(), VertexTransform::Identity).unwrap();
    assert_eq!(buffer.counts, vec![4, 3, 6]);
    assert_eq!(buffer.vertices.len(), 2 * 13);

    let lists = buffer.to_point_lists();
    for (shape, run) in set.iter().zip(&lists) {
        let expected: Vec<[f32; 2]> = shape
            .points()
            .iter()
            .map(|p| [p.x as f32, p.y as f32])
            .collect();
        assert_eq!(&expected, run);
    }
}

#[test]
fn flip_y_mirrors_vertices_about_the_extent() {
    let set = logo();
    let plain = encode_shapes(set.shapes(), VertexTransform::Identity).unwrap();
    let flipped = encode_shapes(set.shapes(), VertexTransform::FlipY { extent: 0.96 }).unwrap();
    assert_eq!(plain.counts, flipped.counts);
    for (a, b) in plain.vertices.chunks(2).zip(flipped.vertices.chunks(2)) {
        assert_eq!(a[0], b[0]);
        assert!((0.96 - a[1] - b[1]).abs() < 1e-6);
    }
}

#[test]
fn oversized_shape_is_an_encode_error() {
    let big = Shape::new((0..300).map(|i| {
        let a = f64::from(i) / 300.0 * std::f64::consts::TAU;
        Point::new(a.cos(), a.sin())
    }))
    .unwrap();
    let err = encode_shapes(&[big], VertexTransform::Identity).unwrap_err();
    assert!(err.to_string().contains("255"));
}

#[test]
fn textures_round_trip_the_buffer_pair() {
    let buffer = encode_shapes(logo().shapes(), VertexTransform::Identity).unwrap();
    let textures = ShapeTextures::from_buffer(&buffer).unwrap();
    assert_eq!(textures.version, SHAPE_TEXTURE_LAYOUT_VERSION);
    assert_eq!(textures.to_buffer(), buffer);

    let json = serde_json::to_string(&buffer).unwrap();
    let back: FlattenedShapeBuffer = serde_json::from_str(&json).unwrap();
    assert_eq!(back, buffer);
}

#[test]
fn texture_trace_matches_cpu_trace() {
    let set = logo();
    let buffer = encode_shapes(set.shapes(), VertexTransform::Identity).unwrap();
    let textures = ShapeTextures::from_buffer(&buffer).unwrap();
    let config = TracerConfig::gpu();
    let ray = RayState::from_pointer(Point::new(0.0, 0.48), Point::new(0.96, 0.52)).unwrap();

    let cpu = trace_refractions(ray, &set, &config);
    let gpu = trace_refractions(ray, &textures, &config);
    assert_eq!(cpu.has_entry(), gpu.has_entry());
    assert_eq!(cpu.bounces.len(), gpu.bounces.len());
    for (a, b) in cpu.bounces.iter().zip(&gpu.bounces) {
        assert!((a.first - b.first).hypot() < 1e-4);
        assert!((a.second - b.second).hypot() < 1e-4);
    }
}

#[test]
fn light_path_texture_holds_one_texel_per_bounce() {
    let set = logo();
    let buffer = encode_shapes(set.shapes(), VertexTransform::Identity).unwrap();
    let textures = ShapeTextures::from_buffer(&buffer).unwrap();
    let config = TracerConfig::gpu();
    let ray = RayState::from_pointer(Point::new(0.0, 0.48), Point::new(0.96, 0.52)).unwrap();

    let tex = render_light_path(&textures, ray, &config).unwrap();
    assert_eq!(tex.image.width(), GPU_MAX_BOUNCES);

    let path = trace_refractions(ray, &textures, &config);
    assert_eq!(tex.len, path.bounces.len());
    for (texel, pair) in tex.image.texels.iter().zip(&path.bounces) {
        assert_eq!(
            *texel,
            [
                pair.first.x as f32,
                pair.first.y as f32,
                pair.second.x as f32,
                pair.second.y as f32
            ]
        );
    }
    assert!(tex.image.texels[tex.len..].iter().all(|t| *t == [0.0; 4]));
}

#[test]
fn mismatched_layout_version_is_rejected() {
    let buffer = encode_shapes(logo().shapes(), VertexTransform::Identity).unwrap();
    let mut textures = ShapeTextures::from_buffer(&buffer).unwrap();
    textures.version += 1;
    let ray = RayState::new(Point::new(0.0, 0.48), refrakt::Vec2::new(1.0, 0.0));
    assert!(render_light_path(&textures, ray, &TracerConfig::gpu()).is_err());
}
