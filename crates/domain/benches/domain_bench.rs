use chrono::Utc;
use common::{Actor, ActorRole, DamageTypeId, SalesPersonId, StoreId, TechnicianId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CreateRepairOrder, Money, NewOrder, Order, OrderOptions, OrderSlugProvider, PhoneNumber,
    PhoneRegion, RandomSlugGenerator, RepairOrderService, Slug,
};
use order_store::InMemoryRepairOrderStore;
use rand::rngs::OsRng;

fn new_order() -> NewOrder {
    NewOrder {
        created_at: Utc::now(),
        slug: Slug::parse("R123-45678-9012").unwrap(),
        store_id: StoreId::new(),
        customer_name: "Budi Santoso".to_string(),
        contact_number: PhoneNumber::parse("081234567890", PhoneRegion::default()).unwrap(),
        phone_type: "Samsung A52".to_string(),
        color: "Black".to_string(),
        sales_person_id: SalesPersonId::new(),
        technician_id: TechnicianId::new(),
        initial_cost: Money::new(350_000),
        damages: vec!["Cracked screen".to_string(), "Battery".to_string()],
        phone_conditions: vec!["Scratched back".to_string()],
        phone_equipments: vec!["Charger".to_string()],
        photos: vec![
            "https://cdn.example.com/front.jpg".to_string(),
            "https://cdn.example.com/back.jpg".to_string(),
        ],
        options: OrderOptions::default(),
    }
}

fn bench_build_order(c: &mut Criterion) {
    let new = new_order();

    c.bench_function("domain/build_order", |b| {
        b.iter(|| Order::new(new.clone()).unwrap());
    });
}

fn bench_phone_parse(c: &mut Criterion) {
    let region = PhoneRegion::default();

    c.bench_function("domain/parse_phone_number", |b| {
        b.iter(|| PhoneNumber::parse("+62 812-3456-7890", region).unwrap());
    });
}

fn bench_slug_generation(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let generator = RandomSlugGenerator::new(InMemoryRepairOrderStore::new());
    let store_id = StoreId::new();

    c.bench_function("domain/random_slug", |b| {
        b.iter(|| Slug::random(&mut OsRng));
    });

    c.bench_function("domain/generate_slug", |b| {
        b.iter(|| rt.block_on(generator.generate(store_id)).unwrap());
    });
}

fn bench_create_repair_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryRepairOrderStore::new();
    let store_id = StoreId::new();
    let technician = TechnicianId::new();
    let sales = SalesPersonId::new();
    let damage = DamageTypeId::new();
    rt.block_on(async {
        store.add_technician(store_id, technician).await;
        store.add_sales_person(store_id, sales).await;
        store.add_damage_type(store_id, damage, "Cracked screen").await;
    });
    let service = RepairOrderService::new(store);
    let actor = Actor::new(UserId::new(), store_id, ActorRole::Employee);
    let cmd = CreateRepairOrder {
        customer_name: "Budi".to_string(),
        contact_phone_number: "081234567890".to_string(),
        phone_type: "Pixel 7".to_string(),
        color: "White".to_string(),
        sales_person_id: sales,
        technician_id: technician,
        initial_cost: 100,
        damage_types: vec![damage],
        phone_conditions: vec![],
        phone_equipments: vec![],
        photos: vec!["https://cdn.example.com/1.jpg".to_string()],
        imei: None,
        parts_not_checked_yet: None,
        passcode: None,
        down_payment: None,
    };

    c.bench_function("domain/create_repair_order", |b| {
        b.iter(|| {
            rt.block_on(service.create_repair_order(Some(&actor), cmd.clone()))
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_build_order,
    bench_phone_parse,
    bench_slug_generation,
    bench_create_repair_order,
);
criterion_main!(benches);
