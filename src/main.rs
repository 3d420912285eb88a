use std::path::PathBuf;

use heightmap_terrain::{
    generation::{perlin_terrain, NoiseSettings},
    meshing::heightmap_to_strip_mesh,
    ElevationGrid, HeightScale,
};

use bevy::{
    log::{error, info, warn},
    pbr::wireframe::{Wireframe, WireframePlugin},
    prelude::*,
    render::{
        settings::{WgpuFeatures, WgpuSettings},
        RenderPlugin,
    },
};
use bevy_atmosphere::prelude::*;
use bevy_fly_camera::{FlyCamera, FlyCameraPlugin};

#[derive(Resource, Clone, Debug, PartialEq)]
struct ViewerConfig {
    heightmap: PathBuf,
    scale: HeightScale,
    wireframe: bool,
    fallback_size: (usize, usize),
    unknown_flags: Vec<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            heightmap: PathBuf::from("img/iceland_heightmap.png"),
            scale: HeightScale::default(),
            wireframe: false,
            fallback_size: (513, 513),
            unknown_flags: Vec::new(),
        }
    }
}

impl ViewerConfig {
    /// `bin [--wireframe] [HEIGHTMAP]`
    fn from_args(args: impl IntoIterator<Item = String>) -> Self {
        let mut config = Self::default();

        for arg in args {
            match arg.as_str() {
                "--wireframe" => config.wireframe = true,
                flag if flag.starts_with("--") => config.unknown_flags.push(flag.to_owned()),
                path => config.heightmap = PathBuf::from(path),
            }
        }

        config
    }
}

fn main() {
    let config = ViewerConfig::from_args(std::env::args().skip(1));

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(RenderPlugin {
        wgpu_settings: WgpuSettings {
            features: WgpuFeatures::POLYGON_MODE_LINE,
            ..default()
        },
    }))
    .add_plugin(AtmospherePlugin)
    .add_plugin(FlyCameraPlugin);

    if config.wireframe {
        app.add_plugin(WireframePlugin);
    }

    app.insert_resource(config)
        .add_startup_system(setup_terrain)
        .run();
}

fn load_grid(config: &ViewerConfig) -> ElevationGrid {
    match ElevationGrid::open(&config.heightmap) {
        Ok(grid) => grid,
        Err(err) => {
            error!(
                "{err}; showing {}x{} procedural terrain instead of {}",
                config.fallback_size.0,
                config.fallback_size.1,
                config.heightmap.display()
            );
            perlin_terrain(config.fallback_size, 2, NoiseSettings::default())
        }
    }
}

fn setup_terrain(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<ViewerConfig>,
) {
    for flag in &config.unknown_flags {
        warn!("ignoring unknown option {flag}");
    }

    let grid = load_grid(&config);
    let terrain = heightmap_to_strip_mesh(&grid, config.scale);

    let strips = terrain.strips();
    info!("Loaded {} vertices", terrain.vertices().len());
    info!(
        "{} strips of {} indices, {} triangles",
        strips.strip_count,
        strips.verts_per_strip,
        strips.num_triangles()
    );

    let (width, height) = terrain.dim();
    let top = terrain.height_range().map_or(0., |(_, hi)| hi);
    let start = Vec3 {
        x: 0.,
        y: top + width.max(height) as f32 * 0.25,
        z: height as f32 / 2.,
    };

    add_camera(&mut commands, start);
    add_lights(&mut commands, top);

    let mut entity = commands.spawn(PbrBundle {
        mesh: meshes.add(terrain.into_render_mesh()),
        material: materials.add(StandardMaterial {
            base_color: Color::rgb(1.0, 0.847, 0.569),
            perceptual_roughness: 0.5,
            unlit: false,
            ..default()
        }),
        ..default()
    });

    if config.wireframe {
        entity.insert(Wireframe);
    }
}

fn add_camera(commands: &mut Commands, start: Vec3) {
    commands
        .spawn(Camera3dBundle {
            transform: Transform::from_translation(start),
            ..default()
        })
        .insert(FlyCamera::default())
        .insert(AtmosphereCamera::default());
}

// Low sun aimed at the terrain centre so ridges shade the slopes behind them
fn add_lights(commands: &mut Commands, peak: f32) {
    commands.insert_resource(AmbientLight {
        color: Color::rgb(0.75, 0.85, 1.0),
        brightness: 0.15,
    });

    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            color: Color::rgb(1.0, 0.95, 0.85),
            illuminance: 20_000.,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_xyz(-1., peak.max(1.), 1.).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_args_uses_defaults() {
        assert_eq!(ViewerConfig::from_args(args(&[])), ViewerConfig::default());
    }

    #[test]
    fn path_and_wireframe() {
        let config = ViewerConfig::from_args(args(&["--wireframe", "maps/alps.png"]));

        assert!(config.wireframe);
        assert_eq!(config.heightmap, PathBuf::from("maps/alps.png"));
        assert_eq!(config.scale, HeightScale::default());
        assert!(config.unknown_flags.is_empty());
    }

    #[test]
    fn mistyped_flag_is_not_a_path() {
        let config = ViewerConfig::from_args(args(&["--wirefrme", "maps/alps.png"]));

        assert!(!config.wireframe);
        assert_eq!(config.heightmap, PathBuf::from("maps/alps.png"));
        assert_eq!(config.unknown_flags, vec!["--wirefrme".to_string()]);
    }

    #[test]
    fn missing_heightmap_falls_back_to_noise() {
        let config = ViewerConfig {
            heightmap: PathBuf::from("no/such/map.png"),
            fallback_size: (9, 5),
            ..default()
        };

        assert_eq!(load_grid(&config).dim(), (9, 5));
    }
}
