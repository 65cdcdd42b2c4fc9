use matcap_text::{
    DemoConfig, Font, FontStatus, Input, RESERVED_CHILDREN, SceneContext, SpinMode, Vec3, Viewport,
};

const FONT: &str = r#"{
    "familyName": "Block",
    "resolution": 1000,
    "boundingBox": { "xMin": 0, "xMax": 800, "yMin": -200, "yMax": 800 },
    "glyphs": {
        "A": { "ha": 700, "o": "m 0 0 l 300 700 l 600 0 z m 200 200 l 400 200 l 300 450 z" },
        "?": { "ha": 500, "o": "m 0 0 l 400 0 l 400 700 l 0 700 z" }
    }
}"#;

const DT: f32 = 1.0 / 60.0;

fn font() -> Font {
    Font::from_json(FONT.as_bytes()).unwrap()
}

fn context(mode: SpinMode) -> SceneContext {
    let mut config = DemoConfig::default();
    config.ornaments.seed = Some(7);
    config.spin.mode = mode;
    let mut ctx = SceneContext::new(config, Viewport::new(1920.0, 1080.0, 1.0));
    ctx.populate(&font());
    ctx
}

#[test]
fn wide_window_flies_camera_to_wide_target() {
    let mut ctx = context(SpinMode::Integrate);
    assert!(!ctx.is_compact());
    assert!(ctx.director.is_flying());

    let input = Input::new();
    for _ in 0..200 {
        ctx.tick(&input, DT);
    }

    assert!(!ctx.director.is_flying());
    let position = ctx.rig.camera.position;
    assert!(
        position.distance(Vec3::new(5.0, -1.0, 5.0)) < 1e-3,
        "camera ended at {position}"
    );
}

#[test]
fn narrow_window_uses_compact_target() {
    let mut config = DemoConfig::default();
    config.ornaments.count = 10;
    let mut ctx = SceneContext::new(config, Viewport::new(400.0, 800.0, 2.0));
    assert!(ctx.is_compact());

    let input = Input::new();
    for _ in 0..200 {
        ctx.tick(&input, DT);
    }
    assert!(ctx.rig.camera.position.distance(Vec3::new(7.0, -1.0, 10.0)) < 1e-3);
}

#[test]
fn default_scene_has_label_and_thousand_ornaments() {
    let ctx = context(SpinMode::Integrate);
    assert_eq!(ctx.scene.len(), 1001);
    assert_eq!(ctx.scene.animated().len(), 1001 - RESERVED_CHILDREN);
    assert_eq!(
        ctx.font_status(),
        &FontStatus::Ready {
            family: "Block".to_owned()
        }
    );
    assert!(ctx.meshes.len() >= 2);
}

#[test]
fn every_spin_mode_touches_each_animated_entity_on_first_frame() {
    for mode in SpinMode::ALL {
        let mut ctx = context(mode);
        let report = ctx.tick(&Input::new(), DT);
        assert_eq!(report.rotated, 999, "{mode}");
    }
}

#[test]
fn reserved_prefix_never_rotates() {
    for mode in SpinMode::ALL {
        let mut ctx = context(mode);
        let reserved: Vec<_> = ctx.scene.children()[..RESERVED_CHILDREN]
            .iter()
            .map(|&e| ctx.scene.transform(e).unwrap())
            .collect();
        let sample = ctx.scene.animated()[0];
        let start_angle = ctx.scene.transform(sample).unwrap().rotation.y;

        let input = Input::new();
        for _ in 0..30 {
            ctx.tick(&input, DT);
        }

        for (&entity, before) in ctx.scene.children()[..RESERVED_CHILDREN].iter().zip(&reserved) {
            assert_eq!(&ctx.scene.transform(entity).unwrap(), before, "{mode}");
        }
        assert!(ctx.scene.transform(sample).unwrap().rotation.y > start_angle, "{mode}");
    }
}

#[test]
fn guarded_spin_keeps_one_tween_per_entity() {
    let mut ctx = context(SpinMode::Guarded);
    let input = Input::new();
    for _ in 0..10 {
        ctx.tick(&input, DT);
    }
    // One spin tween per animated entity plus the camera fly-in.
    assert_eq!(ctx.director.active_tweens(), 999 + 1);
}

#[test]
fn recoloring_label_leaves_ornaments_alone() {
    let mut ctx = context(SpinMode::Integrate);
    let built = ctx.built().unwrap();
    let (label_material, ornament_material) = (built.label_material, built.ornament_material);
    let ornament_before = ctx.materials.get(ornament_material).unwrap().color;

    assert_eq!(ctx.label_color(), Some([0xff, 0x00, 0x00]));
    ctx.set_label_color([0x20, 0x80, 0xff]);

    assert_eq!(ctx.label_color(), Some([0x20, 0x80, 0xff]));
    assert_eq!(ctx.color_binding().unwrap().hex(), 0x2080ff);
    assert_ne!(ctx.materials.get(label_material).unwrap().color, ornament_before);
    assert_eq!(ctx.materials.get(ornament_material).unwrap().color, ornament_before);
}

#[test]
fn same_seed_places_ornaments_identically() {
    let a = context(SpinMode::Integrate);
    let b = context(SpinMode::Integrate);
    let last_a = *a.scene.children().last().unwrap();
    let last_b = *b.scene.children().last().unwrap();
    assert_eq!(a.scene.transform(last_a), b.scene.transform(last_b));
}

#[test]
fn failed_font_leaves_scene_empty_and_reports() {
    let mut ctx = SceneContext::new(DemoConfig::default(), Viewport::new(800.0, 600.0, 1.0));
    ctx.on_font(Font::from_json(b"{ not json"));
    assert!(ctx.scene.is_empty());
    assert!(matches!(ctx.font_status(), FontStatus::Failed(_)));
    assert_eq!(ctx.tick(&Input::new(), DT).rotated, 0);
}
