//! Shared setup for repository tests.

use pmtrack_app::ports::{
    MachineRepository, PmScheduleRepository, ProcedureRepository, PropertyRepository,
    RoomRepository, TopicRepository, UserRepository,
};
use pmtrack_domain::machine::Machine;
use pmtrack_domain::pm_schedule::{FrequencyType, PmSchedule};
use pmtrack_domain::procedure::Procedure;
use pmtrack_domain::property::Property;
use pmtrack_domain::room::Room;
use pmtrack_domain::time::Timestamp;
use pmtrack_domain::topic::Topic;
use pmtrack_domain::user::{User, UserRole};
use sqlx::SqlitePool;

use crate::pool::Config;
use crate::{
    SqliteMachineRepository, SqlitePmScheduleRepository, SqliteProcedureRepository,
    SqlitePropertyRepository, SqliteRoomRepository, SqliteTopicRepository, SqliteUserRepository,
};

pub(crate) async fn pool() -> SqlitePool {
    Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .unwrap()
    .pool()
    .clone()
}

pub(crate) async fn user(pool: &SqlitePool, username: &str, role: UserRole) -> User {
    let user = User::builder()
        .username(username)
        .email(format!("{username}@example.com"))
        .first_name("Test")
        .last_name("User")
        .role(role)
        .password_hash("$argon2id$stub")
        .build()
        .unwrap();
    SqliteUserRepository::new(pool.clone())
        .create(user)
        .await
        .unwrap()
}

pub(crate) async fn property(pool: &SqlitePool, name: &str) -> Property {
    let property = Property::builder().name(name).build().unwrap();
    SqlitePropertyRepository::new(pool.clone())
        .create(property)
        .await
        .unwrap()
}

pub(crate) async fn room(pool: &SqlitePool, property: &Property, name: &str) -> Room {
    let room = Room::builder()
        .property_id(property.id)
        .name(name)
        .build()
        .unwrap();
    SqliteRoomRepository::new(pool.clone())
        .create(room)
        .await
        .unwrap()
}

pub(crate) async fn machine(pool: &SqlitePool, room: &Room, name: &str) -> Machine {
    let machine = Machine::builder()
        .room_id(room.id)
        .name(name)
        .build()
        .unwrap();
    SqliteMachineRepository::new(pool.clone())
        .create(machine)
        .await
        .unwrap()
}

pub(crate) async fn topic(pool: &SqlitePool, title: &str) -> Topic {
    SqliteTopicRepository::new(pool.clone())
        .create(Topic::new(title, None).unwrap())
        .await
        .unwrap()
}

pub(crate) async fn procedure(pool: &SqlitePool, topic: &Topic, title: &str) -> Procedure {
    let procedure = Procedure::builder()
        .topic_id(topic.id)
        .title(title)
        .build()
        .unwrap();
    SqliteProcedureRepository::new(pool.clone())
        .create(procedure)
        .await
        .unwrap()
}

pub(crate) async fn schedule(
    pool: &SqlitePool,
    machine: &Machine,
    procedure: &Procedure,
    user: &User,
    next_due: Timestamp,
) -> PmSchedule {
    let schedule = PmSchedule::builder()
        .machine_id(machine.id)
        .procedure_id(procedure.id)
        .user_id(user.id)
        .frequency(FrequencyType::Monthly)
        .next_due(Some(next_due))
        .build()
        .unwrap();
    SqlitePmScheduleRepository::new(pool.clone())
        .create(schedule)
        .await
        .unwrap()
}
