use anyhow::Result;
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

/// The pre-provisioned platform owner account.
pub const OWNER_USER_ID: Uuid = Uuid::from_u128(0x1);

// Default tag set, assignable by admins.
pub const TAG_OWNER: Uuid = Uuid::from_u128(0x11);
pub const TAG_ADMIN: Uuid = Uuid::from_u128(0x12);
pub const TAG_VERIFIED: Uuid = Uuid::from_u128(0x13);
pub const TAG_TOP_CREATOR: Uuid = Uuid::from_u128(0x14);
pub const TAG_SPECIAL: Uuid = Uuid::from_u128(0x15);
pub const TAG_COMMUNITY: Uuid = Uuid::from_u128(0x16);
pub const TAG_NEW_MEMBER: Uuid = Uuid::from_u128(0x17);
pub const TAG_OFFICIAL: Uuid = Uuid::from_u128(0x18);

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL,
            profile     TEXT NOT NULL,
            balance     REAL NOT NULL DEFAULT 0,
            join_date   TEXT NOT NULL,
            last_seen   TEXT NOT NULL,
            is_online   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS tags (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            color       TEXT NOT NULL,
            text_color  TEXT NOT NULL,
            icon        TEXT,
            created_by  TEXT NOT NULL REFERENCES users(id)
        );

        CREATE TABLE IF NOT EXISTS user_tags (
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            tag_id      TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, tag_id)
        );

        CREATE TABLE IF NOT EXISTS follows (
            follower_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            followed_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (follower_id, followed_id)
        );

        CREATE TABLE IF NOT EXISTS blacklists (
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            by_user_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, by_user_id)
        );

        CREATE TABLE IF NOT EXISTS assets (
            id              TEXT PRIMARY KEY,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL,
            category        TEXT NOT NULL,
            tags            TEXT NOT NULL,
            creator_id      TEXT NOT NULL REFERENCES users(id),
            price           REAL NOT NULL DEFAULT 0,
            is_free         INTEGER NOT NULL DEFAULT 0,
            download_count  INTEGER NOT NULL DEFAULT 0,
            rating          REAL NOT NULL DEFAULT 0,
            rating_count    INTEGER NOT NULL DEFAULT 0,
            status          TEXT NOT NULL DEFAULT 'pending',
            reject_reason   TEXT,
            created_at      TEXT NOT NULL,
            file_size       TEXT NOT NULL,
            thumbnail       TEXT NOT NULL,
            images          TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_assets_status
            ON assets(status, created_at);

        CREATE TABLE IF NOT EXISTS ratings (
            asset_id    TEXT NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            score       INTEGER NOT NULL,
            comment     TEXT NOT NULL,
            PRIMARY KEY (asset_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS purchases (
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            asset_id    TEXT NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, asset_id)
        );

        CREATE TABLE IF NOT EXISTS customer_of (
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            creator_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, creator_id)
        );

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            from_id     TEXT NOT NULL REFERENCES users(id),
            to_id       TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            kind        TEXT NOT NULL,
            read        INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_to
            ON messages(to_id, created_at);

        CREATE TABLE IF NOT EXISTS chat_messages (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            channel     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chat_channel
            ON chat_messages(channel, created_at);

        CREATE TABLE IF NOT EXISTS tickets (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            target_id   TEXT NOT NULL REFERENCES users(id),
            subject     TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'open',
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ticket_messages (
            ticket_id   TEXT NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ticket_messages
            ON ticket_messages(ticket_id, created_at);

        -- Seed the platform owner account
        INSERT OR IGNORE INTO users
            (id, username, email, password, role, profile, balance, join_date, last_seen, is_online)
        VALUES (
            '00000000-0000-0000-0000-000000000001',
            'bazaar_owner',
            'owner@bazaar.dev',
            'owner-dev-password',
            'owner',
            '{\"display_name\":\"Bazaar Studio\",\"bio\":\"Platform owner and lead developer\",\"about_me\":\"Welcome to Bazaar!\",\"custom_status\":\"Managing the platform\",\"banner_color\":\"#0a0a0a\"}',
            999999,
            '2024-01-01T00:00:00Z',
            '2024-01-01T00:00:00Z',
            1
        );

        -- Seed the default tag set
        INSERT OR IGNORE INTO tags (id, name, color, text_color, icon, created_by) VALUES
            ('00000000-0000-0000-0000-000000000011', 'OWNER',            '#e2231a', '#ffffff', 'crown',        '00000000-0000-0000-0000-000000000001'),
            ('00000000-0000-0000-0000-000000000012', 'ADMIN',            '#f59e0b', '#000000', 'shield',       '00000000-0000-0000-0000-000000000001'),
            ('00000000-0000-0000-0000-000000000013', 'Verified Creator', '#3b82f6', '#ffffff', 'check-circle', '00000000-0000-0000-0000-000000000001'),
            ('00000000-0000-0000-0000-000000000014', 'Top Creator',      '#8b5cf6', '#ffffff', 'star',         '00000000-0000-0000-0000-000000000001'),
            ('00000000-0000-0000-0000-000000000015', 'Special User',     '#ec4899', '#ffffff', 'sparkles',     '00000000-0000-0000-0000-000000000001'),
            ('00000000-0000-0000-0000-000000000016', 'Community',        '#10b981', '#ffffff', 'users',        '00000000-0000-0000-0000-000000000001'),
            ('00000000-0000-0000-0000-000000000017', 'New Member',       '#6b7280', '#ffffff', 'user-plus',    '00000000-0000-0000-0000-000000000001'),
            ('00000000-0000-0000-0000-000000000018', 'Official',         '#e2231a', '#ffffff', 'badge-check',  '00000000-0000-0000-0000-000000000001');

        INSERT OR IGNORE INTO user_tags (user_id, tag_id) VALUES
            ('00000000-0000-0000-0000-000000000001', '00000000-0000-0000-0000-000000000011');
        ",
    )?;

    info!("Store migrations complete");
    Ok(())
}
