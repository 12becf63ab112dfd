use super::DBClient;
use crate::models::{Category, Location};

pub trait CategoryExt {
    async fn get_categories(&self) -> Result<Vec<Category>, sqlx::Error>;

    async fn get_category(&self, category_id: i64) -> Result<Category, sqlx::Error>;

    /// Category page lookup; unpublished categories count as missing
    async fn get_published_category(&self, slug: &str) -> Result<Category, sqlx::Error>;

    async fn create_category(
        &self,
        title: &str,
        description: &str,
        slug: &str,
        is_published: bool,
    ) -> Result<Category, sqlx::Error>;

    async fn edit_category(
        &self,
        category_id: i64,
        title: &str,
        description: &str,
        slug: &str,
        is_published: bool,
    ) -> Result<Category, sqlx::Error>;

    /// Posts keep existing with `category_id` set to NULL
    async fn delete_category(&self, category_id: i64) -> Result<(), sqlx::Error>;
}

pub trait LocationExt {
    async fn get_locations(&self) -> Result<Vec<Location>, sqlx::Error>;

    async fn get_location(&self, location_id: i64) -> Result<Location, sqlx::Error>;

    async fn create_location(&self, name: &str, is_published: bool)
    -> Result<Location, sqlx::Error>;

    async fn edit_location(
        &self,
        location_id: i64,
        name: &str,
        is_published: bool,
    ) -> Result<Location, sqlx::Error>;

    /// Posts keep existing with `location_id` set to NULL
    async fn delete_location(&self, location_id: i64) -> Result<(), sqlx::Error>;
}

impl CategoryExt for DBClient {
    async fn get_categories(&self) -> Result<Vec<Category>, sqlx::Error> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM category ORDER BY title, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    async fn get_category(&self, category_id: i64) -> Result<Category, sqlx::Error> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM category WHERE id = $1")
            .bind(category_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(category)
    }

    async fn get_published_category(&self, slug: &str) -> Result<Category, sqlx::Error> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT * FROM category WHERE slug = $1 AND is_published",
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    async fn create_category(
        &self,
        title: &str,
        description: &str,
        slug: &str,
        is_published: bool,
    ) -> Result<Category, sqlx::Error> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO category (title, description, slug, is_published)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(slug)
        .bind(is_published)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    async fn edit_category(
        &self,
        category_id: i64,
        title: &str,
        description: &str,
        slug: &str,
        is_published: bool,
    ) -> Result<Category, sqlx::Error> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE category
            SET title = $1, description = $2, slug = $3, is_published = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(slug)
        .bind(is_published)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    async fn delete_category(&self, category_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM category WHERE id = $1")
            .bind(category_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}

impl LocationExt for DBClient {
    async fn get_locations(&self) -> Result<Vec<Location>, sqlx::Error> {
        let locations = sqlx::query_as::<_, Location>("SELECT * FROM location ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(locations)
    }

    async fn get_location(&self, location_id: i64) -> Result<Location, sqlx::Error> {
        let location = sqlx::query_as::<_, Location>("SELECT * FROM location WHERE id = $1")
            .bind(location_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(location)
    }

    async fn create_location(
        &self,
        name: &str,
        is_published: bool,
    ) -> Result<Location, sqlx::Error> {
        let location = sqlx::query_as::<_, Location>(
            "INSERT INTO location (name, is_published) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(is_published)
        .fetch_one(&self.pool)
        .await?;

        Ok(location)
    }

    async fn edit_location(
        &self,
        location_id: i64,
        name: &str,
        is_published: bool,
    ) -> Result<Location, sqlx::Error> {
        let location = sqlx::query_as::<_, Location>(
            "UPDATE location SET name = $1, is_published = $2 WHERE id = $3 RETURNING *",
        )
        .bind(name)
        .bind(is_published)
        .bind(location_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(location)
    }

    async fn delete_location(&self, location_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM location WHERE id = $1")
            .bind(location_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
