use std::rc::Rc;

use slotec::{Class, ComponentManager, External, Pod, Registry};

#[derive(Debug)]
pub struct WeaponData {
    ammo: u32,
    file: String,
}

#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug)]
pub struct Texture {
    path: &'static str,
}

fn main() {
    let mut registry = Registry::new();
    let mut weapons: ComponentManager<WeaponData, Class> = ComponentManager::new(&mut registry);
    let mut positions: ComponentManager<Position, Pod> = ComponentManager::new(&mut registry);
    let mut textures: ComponentManager<Rc<Texture>, External> = ComponentManager::new(&mut registry);

    let mut shotgun = registry.create_entity();
    weapons.add_component_to(&mut shotgun, 0).unwrap();
    weapons.construct_component(&shotgun, 0, WeaponData { ammo: 12, file: "shotgun.dat".into() });

    positions.add_component_to(&mut shotgun, 0).unwrap();
    *positions.get_component_of_mut(&shotgun, 0).unwrap() = Position { x: 3.0, y: 4.0 };

    let skin = Rc::new(Texture { path: "shotgun.png" });
    textures.add_external_component_to(&mut shotgun, skin.clone(), 0);

    if let Some(w) = weapons.get_component_of(&shotgun, 0) {
        println!("{} ammo: {}, cfg: '{}'", shotgun.id(), w.ammo, w.file);
    }
    println!("{:?}", positions.get_component_of(&shotgun, 0));
    println!("skin {} held {} times", skin.path, Rc::strong_count(&skin));
    println!("entities with a position: {:?}", positions.get_owners(0).iter().collect::<Vec<_>>());

    weapons.remove_component_from(&mut shotgun, 0);
    positions.remove_component_from(&mut shotgun, 0);
    textures.remove_external_component_from(&mut shotgun, 0);
    registry.destroy_entity(shotgun).unwrap();
}
