use crate::error::Result;

use super::Order;

/// Single-entity operations, each run as one transaction.
pub trait Actions<T> {
    type Id;

    fn all(&mut self, order: Order) -> Result<Vec<(Self::Id, T)>>;
    fn create(&mut self, item: T) -> Result<Self::Id>;
    fn read(&mut self, id: Self::Id) -> Result<T>;
    /// Replaces the stored item and returns the previous one.
    fn update(&mut self, id: Self::Id, new_item: T) -> Result<T>;
    /// Deletes the item together with every show it owns.
    fn delete(&mut self, id: Self::Id) -> Result<T>;
}

/// Implements [`Actions`] for a show-owning table.
///
/// `$owner` names the column of `shows` pointing at this table.
macro_rules! derive_actions {
    ($t: ident, $s: ident, $new: ident, $table: ident, $owner: ident) => {
        impl $crate::store::action::Actions<$t> for $crate::store::Session<'_> {
            type Id = $crate::store::Id<$t>;

            fn all(
                &mut self,
                order: $crate::store::Order,
            ) -> $crate::error::Result<Vec<(Self::Id, $t)>> {
                use $crate::store::Order;

                let query: $table::BoxedQuery<'_, diesel::sqlite::Sqlite> =
                    $table::table.into_boxed();
                let query = match order {
                    Order::Id => query.order($table::id.asc()),
                    Order::Name => query.order(($table::name.asc(), $table::id.asc())),
                    Order::Location => query.order((
                        $table::state.asc(),
                        $table::city.asc(),
                        $table::name.asc(),
                        $table::id.asc(),
                    )),
                };

                Ok(query
                    .load::<$s>(self.conn())?
                    .into_iter()
                    .map(|x| x.into())
                    .collect())
            }

            fn create(&mut self, item: $t) -> $crate::error::Result<Self::Id> {
                let sql_item: $new = item.into();
                let id = diesel::insert_into($table::table)
                    .values(&sql_item)
                    .returning($table::id)
                    .get_result::<i32>(self.conn())?;

                log::info!("Created {} {}", <$t as $crate::store::Entity>::KIND, id);
                Ok(id.into())
            }

            fn read(&mut self, item_id: Self::Id) -> $crate::error::Result<$t> {
                $table::table
                    .find(item_id.get())
                    .first::<$s>(self.conn())
                    .optional()?
                    .map(|x| {
                        let (_, item): (Self::Id, $t) = x.into();
                        item
                    })
                    .ok_or_else(|| $crate::error::Error::not_found(item_id))
            }

            fn update(&mut self, item_id: Self::Id, new_item: $t) -> $crate::error::Result<$t> {
                let sql_item: $new = new_item.into();

                self.conn()
                    .transaction::<_, $crate::error::Error, _>(|conn| {
                        let previous = $table::table
                            .find(item_id.get())
                            .first::<$s>(conn)
                            .optional()?
                            .ok_or_else(|| $crate::error::Error::not_found(item_id))?;

                        diesel::update($table::table.find(item_id.get()))
                            .set(&sql_item)
                            .execute(conn)?;

                        let (_, previous): (Self::Id, $t) = previous.into();
                        Ok(previous)
                    })
                    .map(|previous| {
                        log::info!("Updated {} {}", <$t as $crate::store::Entity>::KIND, item_id);
                        previous
                    })
            }

            fn delete(&mut self, item_id: Self::Id) -> $crate::error::Result<$t> {
                use $crate::store::db::schema::shows;

                self.conn()
                    .transaction::<_, $crate::error::Error, _>(|conn| {
                        let previous = $table::table
                            .find(item_id.get())
                            .first::<$s>(conn)
                            .optional()?
                            .ok_or_else(|| $crate::error::Error::not_found(item_id))?;

                        let removed_shows =
                            diesel::delete(shows::table.filter(shows::$owner.eq(item_id.get())))
                                .execute(conn)?;
                        diesel::delete($table::table.find(item_id.get())).execute(conn)?;

                        log::info!(
                            "Deleted {} {} and {} of its shows",
                            <$t as $crate::store::Entity>::KIND,
                            item_id,
                            removed_shows
                        );
                        let (_, previous): (Self::Id, $t) = previous.into();
                        Ok(previous)
                    })
            }
        }
    };
}
