use eyre::Result;
use sqlx::{Executor, Pool, Postgres};
use tracing::info;

/// Tables in creation order. Foreign keys carry no `ON DELETE CASCADE`:
/// dependent rows are removed explicitly by the repositories, inside the
/// transaction that removes their parent.
const TABLES: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            email VARCHAR(255) NOT NULL UNIQUE,
            name VARCHAR(255) NOT NULL,
            password_hash VARCHAR(255) NULL,
            roles TEXT[] NOT NULL DEFAULT ARRAY['musician']::TEXT[],
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT users_roles_known CHECK (
                cardinality(roles) > 0
                AND roles <@ ARRAY['admin', 'leader', 'musician']::TEXT[]
            )
        );
        "#,
    ),
    (
        "songs",
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id UUID PRIMARY KEY,
            title VARCHAR(255) NOT NULL,
            artist VARCHAR(255) NULL,
            ccli_number VARCHAR(32) NULL,
            default_key VARCHAR(8) NULL,
            tempo INTEGER NULL,
            notes TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "song_versions",
        r#"
        CREATE TABLE IF NOT EXISTS song_versions (
            id UUID PRIMARY KEY,
            song_id UUID NOT NULL REFERENCES songs(id),
            name VARCHAR(100) NOT NULL,
            key VARCHAR(8) NULL,
            youtube_url TEXT NULL,
            notes TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "service_types",
        r#"
        CREATE TABLE IF NOT EXISTS service_types (
            id UUID PRIMARY KEY,
            name VARCHAR(100) NOT NULL UNIQUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "services",
        r#"
        CREATE TABLE IF NOT EXISTS services (
            id UUID PRIMARY KEY,
            service_type_id UUID NOT NULL REFERENCES service_types(id),
            date TIMESTAMP WITH TIME ZONE NOT NULL,
            title VARCHAR(200) NULL,
            leader_user_id UUID NULL REFERENCES users(id),
            notes TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "worship_sets",
        r#"
        CREATE TABLE IF NOT EXISTS worship_sets (
            id UUID PRIMARY KEY,
            service_id UUID NOT NULL UNIQUE REFERENCES services(id),
            status VARCHAR(16) NOT NULL DEFAULT 'draft',
            leader_user_id UUID NULL REFERENCES users(id),
            notes TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT worship_sets_status CHECK (status IN ('draft', 'published'))
        );
        "#,
    ),
    (
        "set_songs",
        r#"
        CREATE TABLE IF NOT EXISTS set_songs (
            id UUID PRIMARY KEY,
            worship_set_id UUID NOT NULL REFERENCES worship_sets(id),
            song_version_id UUID NOT NULL REFERENCES song_versions(id),
            position INTEGER NOT NULL,
            key_override VARCHAR(8) NULL,
            is_new BOOLEAN NOT NULL DEFAULT FALSE,
            youtube_url TEXT NULL,
            notes TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT set_songs_position UNIQUE (worship_set_id, position),
            CONSTRAINT set_songs_position_range CHECK (position BETWEEN 1 AND 6)
        );
        "#,
    ),
    (
        "suggestion_slots",
        r#"
        CREATE TABLE IF NOT EXISTS suggestion_slots (
            id UUID PRIMARY KEY,
            worship_set_id UUID NOT NULL REFERENCES worship_sets(id),
            assigned_user_id UUID NOT NULL REFERENCES users(id),
            min_songs INTEGER NOT NULL DEFAULT 1,
            max_songs INTEGER NOT NULL DEFAULT 3,
            due_at TIMESTAMP WITH TIME ZONE NOT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'pending',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT suggestion_slots_bounds CHECK (min_songs >= 0 AND max_songs >= 1 AND min_songs <= max_songs),
            CONSTRAINT suggestion_slots_status CHECK (status IN ('pending', 'submitted'))
        );
        "#,
    ),
    (
        "suggestions",
        r#"
        CREATE TABLE IF NOT EXISTS suggestions (
            id UUID PRIMARY KEY,
            slot_id UUID NOT NULL REFERENCES suggestion_slots(id),
            song_id UUID NOT NULL REFERENCES songs(id),
            suggested_by UUID NOT NULL REFERENCES users(id),
            notes TEXT NULL,
            youtube_url TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "instruments",
        r#"
        CREATE TABLE IF NOT EXISTS instruments (
            id UUID PRIMARY KEY,
            code VARCHAR(32) NOT NULL UNIQUE,
            name VARCHAR(100) NOT NULL,
            display_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "assignments",
        r#"
        CREATE TABLE IF NOT EXISTS assignments (
            id UUID PRIMARY KEY,
            worship_set_id UUID NOT NULL REFERENCES worship_sets(id),
            instrument_id UUID NOT NULL REFERENCES instruments(id),
            user_id UUID NOT NULL REFERENCES users(id),
            status VARCHAR(16) NOT NULL DEFAULT 'invited',
            invited_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            responded_at TIMESTAMP WITH TIME ZONE NULL,
            CONSTRAINT assignments_instrument UNIQUE (worship_set_id, instrument_id),
            CONSTRAINT assignments_status CHECK (status IN ('invited', 'accepted', 'declined', 'withdrawn'))
        );
        "#,
    ),
    (
        "notifications",
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES users(id),
            kind VARCHAR(64) NOT NULL,
            title VARCHAR(200) NOT NULL,
            body TEXT NOT NULL,
            read_at TIMESTAMP WITH TIME ZONE NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
];

const INDEXES: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_song_versions_song_id ON song_versions(song_id);
    CREATE INDEX IF NOT EXISTS idx_services_date ON services(date);
    CREATE INDEX IF NOT EXISTS idx_set_songs_worship_set_id ON set_songs(worship_set_id);
    CREATE INDEX IF NOT EXISTS idx_suggestion_slots_worship_set_id ON suggestion_slots(worship_set_id);
    CREATE INDEX IF NOT EXISTS idx_suggestion_slots_assigned_user_id ON suggestion_slots(assigned_user_id);
    CREATE INDEX IF NOT EXISTS idx_suggestions_slot_id ON suggestions(slot_id);
    CREATE INDEX IF NOT EXISTS idx_assignments_user_id ON assignments(user_id);
    CREATE INDEX IF NOT EXISTS idx_notifications_user_id ON notifications(user_id);
"#;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for (table, ddl) in TABLES {
        tracing::debug!("Creating table {}", table);
        pool.execute(*ddl).await?;
    }

    // Sent without bind parameters so the batch runs as one simple query
    pool.execute(INDEXES).await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
